//! Speech synthesis handlers.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HttpError;
use crate::state::AppState;

/// Request body for `POST /v1/tts/`.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SampleRateResponse {
    pub sample_rate: u32,
}

/// `POST /v1/tts/` - synthesize `text` and return the audio bytes.
///
/// Runs under the caller's `tts` lock and one slot of the process limiter.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<Response, HttpError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(HttpError::BadRequest("Text must not be empty".to_string()));
    }

    let _permit = state.limiter.acquire().await;
    debug!(chars = text.chars().count(), "Synthesizing speech");
    let audio = state.synthesizer.synthesize(text).await?;

    Ok(([(header::CONTENT_TYPE, audio.content_type)], audio.data).into_response())
}

/// `GET /v1/tts/sample_rate` - output sample rate of the configured provider.
pub async fn sample_rate(State(state): State<AppState>) -> Json<SampleRateResponse> {
    Json(SampleRateResponse {
        sample_rate: state.tts_provider.sample_rate(),
    })
}
