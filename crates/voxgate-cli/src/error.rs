//! CLI-specific error types and exit codes.

use thiserror::Error;

use voxgate_auth::JwtError;
use voxgate_core::SettingsError;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// No JWT secret from flag, environment or `.env`.
    #[error("JWT secret is required: pass --jwt-secret or set VOXGATE_JWT_SECRET")]
    MissingJwtSecret,

    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),

    /// Lock store did not answer `check-config --ping`.
    #[error("Lock store unreachable: {0}")]
    StoreUnreachable(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingJwtSecret | Self::Settings(_) | Self::Jwt(_) => 78, // EX_CONFIG
            Self::StoreUnreachable(_) => 69,                                 // EX_UNAVAILABLE
        }
    }
}
