//! Coordination store port - the two primitives the lock manager builds on.
//!
//! # Design Rules
//!
//! - `try_acquire` is a single atomic set-if-absent-with-expiry. The store,
//!   not the caller, is the serialization point.
//! - "Held by someone else" is `Ok(false)`, never an error.
//! - Implementations own one reusable connection and must be safe to call
//!   from many tasks at once.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::LockKey;

/// Errors talking to the coordination store.
#[derive(Debug, Error)]
pub enum LockStoreError {
    /// Network, transport or server-side failure.
    #[error("Lock store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with something the client cannot interpret.
    #[error("Unexpected lock store reply: {0}")]
    Protocol(String),
}

/// Set-if-absent / delete primitives over a shared key-value store.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Create `key` with a server-enforced expiry of `ttl` if it does not exist.
    ///
    /// Returns `true` iff this call created the record.
    async fn try_acquire(&self, key: &LockKey, ttl: Duration) -> Result<bool, LockStoreError>;

    /// Delete `key`. Deleting a missing or expired key succeeds.
    async fn release(&self, key: &LockKey) -> Result<(), LockStoreError>;

    /// Round-trip check used by health reporting.
    async fn ping(&self) -> Result<(), LockStoreError>;

    /// Tear down the connection. Idempotent; later calls reconnect lazily.
    async fn close(&self);

    /// Short backend label for logs (`redis`, `memory`).
    fn backend_name(&self) -> &'static str;
}
