//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `redis`, `jsonwebtoken` or `axum` types in any signature
//! - Expected outcomes (lock held elsewhere) are values, not errors
//! - Adapters map these errors to their own surfaces (HTTP status codes)

pub mod lock_store;
pub mod speech;
pub mod token_verifier;

pub use lock_store::{LockStore, LockStoreError};
pub use speech::{SpeechError, SpeechSynthesizer, SynthesizedAudio, Transcriber};
pub use token_verifier::{AuthError, TokenVerifier, VerifiedClaims};
