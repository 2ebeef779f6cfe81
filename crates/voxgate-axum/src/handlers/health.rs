use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tokio::time::timeout;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub lock_store_up: bool,
    pub stt_up: bool,
    pub tts_up: bool,
}

/// `GET /v1/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_timeout = state.lock_manager.config().store_timeout;
    let lock_store = timeout(store_timeout, state.lock_manager.store().ping());

    let (lock_store, stt_up, tts_up) = tokio::join!(
        lock_store,
        state.transcriber.is_up(),
        state.synthesizer.is_up(),
    );

    Json(HealthResponse {
        lock_store_up: matches!(lock_store, Ok(Ok(()))),
        stt_up,
        tts_up,
    })
}
