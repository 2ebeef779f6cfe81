//! User identity extraction from bearer credentials.
//!
//! Two credential shapes converge on the same verification step:
//!
//! - `Authorization: Bearer <token>` on ordinary requests
//! - a `Bearer.<token>` entry among the offered sub-protocols on upgrade
//!   requests, where browsers cannot set headers

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::UserId;
use crate::ports::{AuthError, TokenVerifier};

/// Scheme prefix of an `Authorization` header value.
pub const HEADER_BEARER_PREFIX: &str = "Bearer ";

/// Prefix of a sub-protocol entry carrying a token.
pub const SUBPROTOCOL_BEARER_PREFIX: &str = "Bearer.";

/// Where a gated route expects its credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// `Authorization: Bearer <token>`.
    AuthorizationHeader,
    /// `Sec-WebSocket-Protocol: Bearer.<token>`.
    Subprotocol,
}

/// Credential material pulled from a request, before verification.
#[derive(Debug, Clone, Copy)]
pub enum CredentialSource<'a> {
    /// Raw `Authorization` header value, if any.
    AuthorizationHeader(Option<&'a str>),
    /// Offered sub-protocols, in client order.
    Subprotocols(&'a [&'a str]),
}

impl<'a> CredentialSource<'a> {
    /// The bearer token, if the credential has the expected shape.
    pub fn token(&self) -> Option<&'a str> {
        let token = match *self {
            Self::AuthorizationHeader(header) => header?.strip_prefix(HEADER_BEARER_PREFIX)?,
            Self::Subprotocols(protocols) => protocols
                .iter()
                .copied()
                .find_map(|p| p.strip_prefix(SUBPROTOCOL_BEARER_PREFIX))?,
        };
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::AuthorizationHeader(_) => "authorization header",
            Self::Subprotocols(_) => "websocket subprotocol",
        }
    }
}

/// Verify the credential in `source` and return the subject as a [`UserId`].
pub fn extract_user_id(
    source: CredentialSource<'_>,
    verifier: &dyn TokenVerifier,
) -> Result<UserId, AuthError> {
    let token = source.token().ok_or(AuthError::MissingCredential)?;

    let claims = verifier.verify(token).inspect_err(|_| {
        warn!(source = source.label(), "Failed to verify bearer token");
    })?;

    let subject = claims.subject.ok_or_else(|| {
        warn!(source = source.label(), "Verified token has no subject claim");
        AuthError::InvalidCredential
    })?;

    UserId::new(subject).map_err(|_| {
        warn!(source = source.label(), "Verified token has an empty subject claim");
        AuthError::InvalidCredential
    })
}

/// Split a comma-separated `Sec-WebSocket-Protocol` header value.
pub fn split_subprotocols(header: &str) -> Vec<&str> {
    header
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
