//! Token verification port.

use thiserror::Error;

/// Authentication failures. Both variants are reported to clients as 401;
/// the distinction only feeds logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential in the expected shape.
    #[error("Authentication required")]
    MissingCredential,

    /// The token failed verification or carries no subject.
    #[error("Invalid token")]
    InvalidCredential,
}

/// Claims the gate cares about once a token has been verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// The `sub` claim, if present.
    pub subject: Option<String>,
}

/// Verifies a signed token and returns its claims.
///
/// Implementations must not log or echo the token.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError>;
}
