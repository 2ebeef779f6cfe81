//! Axum-specific error types and mappings.
//!
//! Maps core errors (`AuthError`, `LockError`, `SpeechError`) to HTTP status
//! codes and JSON response bodies.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use voxgate_core::{AuthError, LockError, SpeechError};

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Missing or unverifiable credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Per-user lock still held after the retry budget.
    #[error("{0}")]
    TooManyRequests(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Service unavailable (lock store or speech provider down).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Unauthorized(msg)
            | Self::TooManyRequests(msg)
            | Self::BadRequest(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Internal(msg) => msg.clone(),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<LockError> for HttpError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::ContentionExhausted { .. } => Self::TooManyRequests(err.to_string()),
            LockError::StoreUnavailable(_) => {
                Self::ServiceUnavailable("Lock service unavailable. Please retry later.".to_string())
            }
        }
    }
}

impl From<SpeechError> for HttpError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Unavailable(msg) => Self::ServiceUnavailable(msg),
            SpeechError::InvalidRequest(msg) => Self::BadRequest(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxgate_core::LockName;

    #[test]
    fn test_lock_errors_map_to_status() {
        let busy = HttpError::from(LockError::ContentionExhausted {
            lock_name: LockName::tts(),
            attempts: 7,
        });
        assert_eq!(busy.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            busy.to_string(),
            "Another TTS operation is currently in progress. Please wait."
        );

        let down = HttpError::from(LockError::StoreUnavailable("connection refused".into()));
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
        // Store internals stay out of client responses.
        assert!(!down.to_string().contains("refused"));
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = HttpError::from(AuthError::MissingCredential).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
