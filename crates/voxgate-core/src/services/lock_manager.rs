//! Per-user distributed lock manager.
//!
//! Acquisition is a bounded retry loop over the store's atomic
//! set-if-absent primitive, with exponential backoff between attempts.
//! A successful acquisition yields a [`LockGuard`] that deletes the record
//! exactly once: explicitly via [`LockGuard::release`], or from `Drop` when
//! the holding future is cancelled or panics.
//!
//! There is no FIFO fairness between waiters for the same key: whichever
//! attempt reaches the store first after a release wins, so a later arrival
//! can overtake an earlier one.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::{LockKey, LockName, RetryPolicy, UserId};
use crate::ports::LockStore;

/// Default lifetime of a lock record before the store reclaims it.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(300);

/// Default bound on a single store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Lock acquisition failures.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder kept the lock through the whole retry budget.
    #[error(
        "Another {} operation is currently in progress. Please wait.",
        .lock_name.display_label()
    )]
    ContentionExhausted { lock_name: LockName, attempts: u32 },

    /// The coordination store failed or did not answer in time.
    #[error("Lock store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Timing policy for a [`LockManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockManagerConfig {
    /// Safety expiry on each lock record. Must exceed the longest guarded
    /// operation, or a slow holder can lose its lock to a new one.
    pub lock_ttl: Duration,
    /// Acquisition retry budget.
    pub retry: RetryPolicy,
    /// Bound on each individual store call.
    pub store_timeout: Duration,
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        Self {
            lock_ttl: DEFAULT_LOCK_TTL,
            retry: RetryPolicy::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Acquires and releases per-user locks through a shared [`LockStore`].
pub struct LockManager {
    store: Arc<dyn LockStore>,
    config: LockManagerConfig,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>, config: LockManagerConfig) -> Self {
        Self { store, config }
    }

    pub const fn config(&self) -> &LockManagerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LockStore> {
        &self.store
    }

    /// Acquire `lock_name` for `user_id`, backing off between attempts.
    ///
    /// Dropping the returned future while it waits stops the loop without
    /// touching the store again.
    pub async fn acquire(
        &self,
        user_id: &UserId,
        lock_name: &LockName,
    ) -> Result<LockGuard, LockError> {
        let key = LockKey::new(lock_name, user_id);
        let policy = self.config.retry;

        for attempt in 0..policy.max_attempts {
            if self.try_acquire_once(&key).await? {
                info!(
                    user_id = %user_id,
                    lock = %lock_name,
                    attempt = attempt + 1,
                    "Acquired lock"
                );
                return Ok(LockGuard {
                    store: Arc::clone(&self.store),
                    key,
                    lock_name: lock_name.clone(),
                    store_timeout: self.config.store_timeout,
                    released: false,
                });
            }

            let delay = policy.delay_for(attempt);
            debug!(
                user_id = %user_id,
                lock = %lock_name,
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Lock held elsewhere, backing off"
            );
            tokio::time::sleep(delay).await;
        }

        warn!(
            user_id = %user_id,
            lock = %lock_name,
            attempts = policy.max_attempts,
            "Could not acquire lock, retry budget exhausted"
        );
        Err(LockError::ContentionExhausted {
            lock_name: lock_name.clone(),
            attempts: policy.max_attempts,
        })
    }

    /// Run `op` while holding `lock_name` for `user_id`.
    ///
    /// The output of `op` is returned unchanged; the lock is released before
    /// returning, and from `Drop` if this future is cancelled mid-operation.
    pub async fn with_lock<F, T>(
        &self,
        user_id: &UserId,
        lock_name: &LockName,
        op: F,
    ) -> Result<T, LockError>
    where
        F: Future<Output = T>,
    {
        let guard = self.acquire(user_id, lock_name).await?;
        let output = op.await;
        guard.release().await;
        Ok(output)
    }

    /// Close the underlying store connection.
    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn try_acquire_once(&self, key: &LockKey) -> Result<bool, LockError> {
        let attempt = self.store.try_acquire(key, self.config.lock_ttl);
        match timeout(self.config.store_timeout, attempt).await {
            Ok(Ok(acquired)) => Ok(acquired),
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Lock store call failed");
                Err(LockError::StoreUnavailable(e.to_string()))
            }
            // The SET may still land server-side; the TTL reclaims it. Deleting
            // here could remove another holder's record.
            Err(_) => {
                warn!(
                    key = %key,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "Lock store call timed out"
                );
                Err(LockError::StoreUnavailable(format!(
                    "no reply within {:?}",
                    self.config.store_timeout
                )))
            }
        }
    }
}

/// A held lock. Deletes its record exactly once.
pub struct LockGuard {
    store: Arc<dyn LockStore>,
    key: LockKey,
    lock_name: LockName,
    store_timeout: Duration,
    released: bool,
}

impl LockGuard {
    pub const fn key(&self) -> &LockKey {
        &self.key
    }

    pub const fn lock_name(&self) -> &LockName {
        &self.lock_name
    }

    /// Delete the lock record. Failures are logged; the TTL covers them.
    ///
    /// If this future is dropped before the delete finishes, the guard's
    /// `Drop` still schedules the release.
    pub async fn release(mut self) {
        release_key(Arc::clone(&self.store), self.key.clone(), self.store_timeout).await;
        self.released = true;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let store_timeout = self.store_timeout;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(key = %key, "Lock guard dropped while held, releasing in background");
                handle.spawn(release_key(store, key, store_timeout));
            }
            Err(_) => {
                warn!(key = %key, "Lock guard dropped outside a runtime, record left to expire");
            }
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("backend", &self.store.backend_name())
            .field("released", &self.released)
            .finish()
    }
}

async fn release_key(store: Arc<dyn LockStore>, key: LockKey, store_timeout: Duration) {
    match timeout(store_timeout, store.release(&key)).await {
        Ok(Ok(())) => info!(key = %key, "Released lock"),
        Ok(Err(e)) => warn!(key = %key, error = %e, "Failed to release lock, record left to expire"),
        Err(_) => warn!(key = %key, "Lock release timed out, record left to expire"),
    }
}

/// A lock shared between the request that acquired it and a session that
/// outlives the request (e.g. an upgraded WebSocket).
///
/// The record is deleted when the last clone is released or dropped.
#[derive(Debug, Clone)]
pub struct SessionLease(Arc<LockGuard>);

impl SessionLease {
    pub fn new(guard: LockGuard) -> Self {
        Self(Arc::new(guard))
    }

    pub fn key(&self) -> &LockKey {
        self.0.key()
    }

    pub fn lock_name(&self) -> &LockName {
        self.0.lock_name()
    }

    /// Release this handle. Only the last live handle deletes the record.
    pub async fn release(self) {
        if let Ok(guard) = Arc::try_unwrap(self.0) {
            guard.release().await;
        }
    }
}
