#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;
pub mod store;

// Re-export commonly used types for convenience
pub use domain::{IdentityError, LockKey, LockName, RetryPolicy, UserId};
pub use ports::{
    AuthError, LockStore, LockStoreError, SpeechError, SpeechSynthesizer, SynthesizedAudio,
    TokenVerifier, Transcriber, VerifiedClaims,
};
pub use services::{
    ConcurrencyLimiter, CredentialKind, CredentialSource, GatePolicy, GatedRoute, LimiterPermit,
    LockError, LockGuard, LockManager, LockManagerConfig, NEW_CONVERSATION_PATH, SessionLease,
    TTS_PATH, extract_user_id, split_subprotocols,
};
pub use settings::{
    DEFAULT_LOCK_TTL_SECONDS, DEFAULT_STORE_TIMEOUT_MS, GateSettings, MAX_CONCURRENT_SYNTHESIS,
    MAX_LOCK_TTL_SECONDS, SettingsError, StoreFailureMode, TtsProvider, validate_settings,
};
pub use store::MemoryLockStore;
