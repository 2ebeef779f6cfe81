//! Gate settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. Adapters build
//! these from CLI flags, environment variables or a JSON settings file.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::RetryPolicy;
use crate::services::gate_policy::{GatePolicy, GatedRoute};
use crate::services::limiter::DEFAULT_MAX_CONCURRENT;
use crate::services::lock_manager::LockManagerConfig;

/// Default lock record lifetime in seconds.
pub const DEFAULT_LOCK_TTL_SECONDS: u64 = 300;

/// Default bound on one store round trip in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

/// Longest accepted lock lifetime (one day).
pub const MAX_LOCK_TTL_SECONDS: u64 = 86_400;

/// Largest accepted synthesis concurrency per process.
pub const MAX_CONCURRENT_SYNTHESIS: usize = 1_024;

/// What the gate does when the coordination store cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailureMode {
    /// Reject the request (503). The per-user guarantee cannot hold without
    /// the store.
    #[default]
    FailClosed,
    /// Let the request through unguarded and log a warning.
    FailOpen,
}

impl FromStr for StoreFailureMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            "fail_open" | "open" => Ok(Self::FailOpen),
            other => Err(SettingsError::UnknownFailureMode(other.to_string())),
        }
    }
}

/// Text-to-speech backend family. Only affects reported audio format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    Pocket,
    Gradium,
    Dsm,
}

impl TtsProvider {
    /// Output sample rate in Hz.
    pub const fn sample_rate(self) -> u32 {
        match self {
            Self::Gradium => 48_000,
            Self::Pocket | Self::Dsm => 24_000,
        }
    }

    /// Voice used when none is configured.
    pub const fn default_voice(self) -> &'static str {
        match self {
            Self::Gradium => "Lxc7YlPC8ckLJA8H",
            Self::Dsm => "unmute-prod-website/developer-1.mp3",
            Self::Pocket => "alba",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pocket => "pocket",
            Self::Gradium => "gradium",
            Self::Dsm => "dsm",
        }
    }
}

impl FromStr for TtsProvider {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pocket" => Ok(Self::Pocket),
            "gradium" => Ok(Self::Gradium),
            "dsm" => Ok(Self::Dsm),
            other => Err(SettingsError::UnknownTtsProvider(other.to_string())),
        }
    }
}

/// Settings for the lock gate and the services it protects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GateSettings {
    /// Lifetime of a lock record; must exceed the longest guarded operation.
    pub lock_ttl_seconds: u64,
    /// Bound on each store round trip.
    pub store_timeout_ms: u64,
    /// Acquisition retry budget.
    pub retry: RetryPolicy,
    pub store_failure_mode: StoreFailureMode,
    /// Concurrent synthesis operations per process.
    pub max_concurrent_synthesis: usize,
    /// Keep the built-in TTS and conversation routes in the gate table.
    pub include_default_routes: bool,
    /// Extra gated routes, appended after the built-in ones.
    pub gated_routes: Vec<GatedRoute>,
    pub tts_provider: TtsProvider,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl GateSettings {
    pub fn with_defaults() -> Self {
        Self {
            lock_ttl_seconds: DEFAULT_LOCK_TTL_SECONDS,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            store_failure_mode: StoreFailureMode::default(),
            max_concurrent_synthesis: DEFAULT_MAX_CONCURRENT,
            include_default_routes: true,
            gated_routes: Vec::new(),
            tts_provider: TtsProvider::default(),
        }
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {e}", path.display())))?;
        let settings: Self =
            serde_json::from_str(&raw).map_err(|e| SettingsError::Parse(e.to_string()))?;
        validate_settings(&settings)?;
        Ok(settings)
    }

    pub const fn lock_manager_config(&self) -> LockManagerConfig {
        LockManagerConfig {
            lock_ttl: Duration::from_secs(self.lock_ttl_seconds),
            retry: self.retry,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }

    /// The effective gate table.
    pub fn gate_policy(&self) -> GatePolicy {
        let base = if self.include_default_routes {
            GatePolicy::default()
        } else {
            GatePolicy::empty()
        };
        base.with_routes(self.gated_routes.iter().cloned())
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Lock TTL must be between 1 and {MAX_LOCK_TTL_SECONDS} seconds")]
    InvalidLockTtl,

    #[error("Retry budget must allow at least 1 attempt")]
    InvalidRetryAttempts,

    #[error("Backoff base delay ({base_ms} ms) must be positive and not exceed max delay ({max_ms} ms)")]
    InvalidBackoff { base_ms: u64, max_ms: u64 },

    #[error("Store timeout must be positive")]
    InvalidStoreTimeout,

    #[error("Max concurrent synthesis must be between 1 and {MAX_CONCURRENT_SYNTHESIS}")]
    InvalidConcurrency,

    #[error("Gated route path must start with '/': {0}")]
    InvalidRoutePath(String),

    #[error("Unknown TTS provider '{0}', must be 'pocket', 'gradium' or 'dsm'")]
    UnknownTtsProvider(String),

    #[error("Unknown store failure mode '{0}', must be 'fail_closed' or 'fail_open'")]
    UnknownFailureMode(String),

    #[error("Failed to read settings: {0}")]
    Io(String),

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &GateSettings) -> Result<(), SettingsError> {
    if !(1..=MAX_LOCK_TTL_SECONDS).contains(&settings.lock_ttl_seconds) {
        return Err(SettingsError::InvalidLockTtl);
    }
    if settings.retry.max_attempts == 0 {
        return Err(SettingsError::InvalidRetryAttempts);
    }
    let (base_ms, max_ms) = (settings.retry.base_delay_ms, settings.retry.max_delay_ms);
    if base_ms == 0 || base_ms > max_ms {
        return Err(SettingsError::InvalidBackoff { base_ms, max_ms });
    }
    if settings.store_timeout_ms == 0 {
        return Err(SettingsError::InvalidStoreTimeout);
    }
    if !(1..=MAX_CONCURRENT_SYNTHESIS).contains(&settings.max_concurrent_synthesis) {
        return Err(SettingsError::InvalidConcurrency);
    }
    if let Some(route) = settings.gated_routes.iter().find(|r| !r.path.starts_with('/')) {
        return Err(SettingsError::InvalidRoutePath(route.path.clone()));
    }
    Ok(())
}
