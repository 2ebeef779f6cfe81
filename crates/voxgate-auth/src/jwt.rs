//! HMAC JWT verification and issuing.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use voxgate_core::ports::{AuthError, TokenVerifier, VerifiedClaims};

/// Clock skew tolerated on `exp`, in seconds.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Verifier construction and token issuing errors.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("Unsupported JWT algorithm '{0}', expected HS256, HS384 or HS512")]
    UnsupportedAlgorithm(String),

    #[error("Cannot issue a token with an empty subject")]
    EmptySubject,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    exp: u64,
    #[serde(default)]
    iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
}

/// Shared-secret JWT verifier.
pub struct JwtVerifier {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtVerifier {
    /// HS256 verifier for `secret`.
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        Self::with_algorithm(secret, Algorithm::HS256)
    }

    /// Verifier for `secret` using an HMAC algorithm.
    pub fn with_algorithm(secret: &[u8], algorithm: Algorithm) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(JwtError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = DEFAULT_LEEWAY_SECS;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: None,
        })
    }

    /// Parse an algorithm name as given on the command line.
    pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(JwtError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Require (and stamp issued tokens with) an `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.validation.set_issuer(&[issuer.as_str()]);
        // set_issuer alone only checks `iss` when the claim is present.
        self.validation.set_required_spec_claims(&["exp", "iss"]);
        self.issuer = Some(issuer);
        self
    }

    #[must_use]
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.validation.leeway = leeway_secs;
        self
    }

    /// Sign a token for `subject` that expires after `ttl`.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, JwtError> {
        if subject.trim().is_empty() {
            return Err(JwtError::EmptySubject);
        }
        let now = get_current_timestamp();
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: now.saturating_add(ttl.as_secs()),
            iat: now,
            iss: self.issuer.clone(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            // Only the error kind; never the token.
            debug!(reason = ?e.kind(), "JWT rejected");
            AuthError::InvalidCredential
        })?;
        Ok(VerifiedClaims {
            subject: data.claims.sub,
        })
    }
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
