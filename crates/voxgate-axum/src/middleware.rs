//! Per-user lock gate.
//!
//! For each request the [`GatePolicy`](voxgate_core::GatePolicy) decides
//! whether a lock is needed. Gated requests are authenticated, then run while
//! holding `<lock-name>:lock:<user-id>`. Ungated requests pass straight
//! through without touching the lock store.
//!
//! The lock is shared with the handler as a [`SessionLease`] request
//! extension. Handlers whose work outlives the response (WebSocket sessions)
//! keep a clone; the record is deleted when the last clone goes away.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use voxgate_core::{
    AuthError, CredentialKind, CredentialSource, LockError, SessionLease, StoreFailureMode,
    TokenVerifier, UserId, extract_user_id, split_subprotocols,
};

use crate::error::HttpError;
use crate::state::AppState;

/// Axum middleware applying the gate table; install with
/// `axum::middleware::from_fn_with_state`.
pub async fn lock_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(route) = state
        .policy
        .match_request(req.method().as_str(), req.uri().path())
    else {
        return next.run(req).await;
    };

    let user_id = match identify(&req, route.credential, state.verifier.as_ref()) {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(
                path = %req.uri().path(),
                lock = %route.lock_name,
                "Rejected unauthenticated request to gated route"
            );
            return HttpError::from(e).into_response();
        }
    };

    match state.lock_manager.acquire(&user_id, &route.lock_name).await {
        Ok(guard) => {
            let lease = SessionLease::new(guard);
            req.extensions_mut().insert(lease.clone());
            let response = next.run(req).await;
            lease.release().await;
            response
        }
        Err(LockError::StoreUnavailable(reason))
            if state.failure_mode == StoreFailureMode::FailOpen =>
        {
            warn!(
                user_id = %user_id,
                lock = %route.lock_name,
                reason = %reason,
                "Lock store unavailable, serving request without a lock"
            );
            next.run(req).await
        }
        Err(e) => {
            debug!(
                user_id = %user_id,
                lock = %route.lock_name,
                error = %e,
                "Lock gate rejected request"
            );
            HttpError::from(e).into_response()
        }
    }
}

fn identify(
    req: &Request,
    credential: CredentialKind,
    verifier: &dyn TokenVerifier,
) -> Result<UserId, AuthError> {
    match credential {
        CredentialKind::AuthorizationHeader => {
            let header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            extract_user_id(CredentialSource::AuthorizationHeader(header), verifier)
        }
        CredentialKind::Subprotocol => {
            let offered = offered_subprotocols(req.headers());
            extract_user_id(CredentialSource::Subprotocols(&offered), verifier)
        }
    }
}

/// Every sub-protocol the client offered, across repeated headers.
pub(crate) fn offered_subprotocols(headers: &axum::http::HeaderMap) -> Vec<&str> {
    headers
        .get_all(header::SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(split_subprotocols)
        .collect()
}
