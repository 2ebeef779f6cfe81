//! Route definitions and router construction.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voxgate_core::{NEW_CONVERSATION_PATH, TTS_PATH};

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::middleware::lock_gate;
use crate::state::AppState;

/// Path of the sample rate endpoint.
pub const SAMPLE_RATE_PATH: &str = "/v1/tts/sample_rate";

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/v1/health";

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Create the router with every route behind the lock gate.
///
/// The gate wraps the whole router rather than individual routes, so routes
/// added to the gate table by configuration are covered too.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route(TTS_PATH, post(handlers::tts::synthesize))
        .route(SAMPLE_RATE_PATH, get(handlers::tts::sample_rate))
        .route(
            NEW_CONVERSATION_PATH,
            get(handlers::conversation::new_conversation),
        )
        .route(HEALTH_PATH, get(handlers::health::health))
        .layer(from_fn_with_state(state.clone(), lock_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
