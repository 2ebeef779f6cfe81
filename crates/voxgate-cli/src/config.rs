//! Flag/environment mapping onto the server configuration.
//!
//! Precedence: built-in defaults, then the JSON settings file, then
//! individual flags or environment variables.

use voxgate_axum::{CorsConfig, LockStoreBackend, ServerConfig};
use voxgate_core::{GateSettings, StoreFailureMode, TtsProvider, validate_settings};

use crate::error::CliError;
use crate::parser::{GateArgs, LockStoreKind};

impl GateArgs {
    /// Merged gate settings.
    pub fn gate_settings(&self) -> Result<GateSettings, CliError> {
        let mut settings = match &self.settings {
            Some(path) => GateSettings::load_json(path)?,
            None => GateSettings::with_defaults(),
        };

        if let Some(ttl) = self.lock_ttl_seconds {
            settings.lock_ttl_seconds = ttl;
        }
        if let Some(timeout_ms) = self.store_timeout_ms {
            settings.store_timeout_ms = timeout_ms;
        }
        if let Some(max) = self.max_concurrent_synthesis {
            settings.max_concurrent_synthesis = max;
        }
        if self.fail_open {
            settings.store_failure_mode = StoreFailureMode::FailOpen;
        }
        if let Some(provider) = &self.tts_provider {
            settings.tts_provider = provider.parse::<TtsProvider>()?;
        }

        validate_settings(&settings)?;
        Ok(settings)
    }

    pub fn lock_store_backend(&self) -> LockStoreBackend {
        match self.lock_store {
            LockStoreKind::Memory => LockStoreBackend::Memory,
            LockStoreKind::Redis => LockStoreBackend::Redis {
                url: self.redis_url.clone().unwrap_or_else(|| {
                    format!(
                        "redis://{}:{}/{}",
                        self.redis_host, self.redis_port, self.redis_db
                    )
                }),
            },
        }
    }

    pub fn jwt_secret(&self) -> Result<&str, CliError> {
        self.jwt
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(CliError::MissingJwtSecret)
    }

    pub fn to_server_config(&self) -> Result<ServerConfig, CliError> {
        let mut config = ServerConfig::with_defaults(self.jwt_secret()?);
        config.host.clone_from(&self.host);
        config.port = self.port;
        config.lock_store = self.lock_store_backend();
        config.jwt_algorithm.clone_from(&self.jwt.jwt_algorithm);
        config.jwt_issuer.clone_from(&self.jwt.jwt_issuer);
        config.tts_server = non_empty(self.tts_server.as_deref());
        config.stt_server = non_empty(self.stt_server.as_deref());
        config.tts_voice = non_empty(self.tts_voice.as_deref());
        config.settings = self.gate_settings()?;
        config.cors = if self.cors_origin.is_empty() {
            CorsConfig::AllowAll
        } else {
            CorsConfig::AllowOrigins(self.cors_origin.clone())
        };
        Ok(config)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
