//! In-process [`LockStore`] for single-instance deployments and tests.
//!
//! Expiry deadlines use the tokio clock, so tests running with a paused
//! clock can advance past a TTL deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::LockKey;
use crate::ports::{LockStore, LockStoreError};

/// HashMap-backed lock store with per-key deadlines.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    records: Mutex<HashMap<String, Instant>>,
    operations: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `try_acquire`/`release`/`ping` calls served so far.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Whether `key` is currently held (present and not expired).
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.records()
            .get(key)
            .is_some_and(|deadline| *deadline > now)
    }

    /// Make every subsequent call fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_operation(&self) -> Result<(), LockStoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LockStoreError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn try_acquire(&self, key: &LockKey, ttl: Duration) -> Result<bool, LockStoreError> {
        self.begin_operation()?;
        let now = Instant::now();
        let mut records = self.records();
        match records.get(key.as_str()) {
            Some(deadline) if *deadline > now => Ok(false),
            _ => {
                let deadline = now.checked_add(ttl).ok_or_else(|| {
                    LockStoreError::Protocol(format!("lock ttl out of range: {ttl:?}"))
                })?;
                records.insert(key.as_str().to_string(), deadline);
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &LockKey) -> Result<(), LockStoreError> {
        self.begin_operation()?;
        self.records().remove(key.as_str());
        Ok(())
    }

    async fn ping(&self) -> Result<(), LockStoreError> {
        self.begin_operation()
    }

    async fn close(&self) {
        // Records model server-side state and survive a client disconnect.
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LockName, UserId};

    fn key(user: &str) -> LockKey {
        LockKey::new(&LockName::tts(), &UserId::new(user).unwrap())
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let store = MemoryLockStore::new();
        let ttl = Duration::from_secs(300);

        assert!(store.try_acquire(&key("a"), ttl).await.unwrap());
        assert!(!store.try_acquire(&key("a"), ttl).await.unwrap());
        assert!(store.try_acquire(&key("b"), ttl).await.unwrap());
        assert_eq!(store.operation_count(), 3);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_an_error() {
        let store = MemoryLockStore::new();

        let err = store.try_acquire(&key("a"), Duration::MAX).await.unwrap_err();
        assert!(matches!(err, LockStoreError::Protocol(_)));
        assert!(!store.contains("tts:lock:a"));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let store = MemoryLockStore::new();
        let k = key("a");

        assert!(store.try_acquire(&k, Duration::from_secs(5)).await.unwrap());
        store.release(&k).await.unwrap();
        store.release(&k).await.unwrap();
        assert!(!store.contains(k.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_record_can_be_reacquired() {
        let store = MemoryLockStore::new();
        let k = key("a");

        assert!(store.try_acquire(&k, Duration::from_secs(1)).await.unwrap());
        tokio::time::advance(Duration::from_millis(1_050)).await;
        assert!(!store.contains(k.as_str()));
        assert!(store.try_acquire(&k, Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MemoryLockStore::new();
        store.set_unavailable(true);

        let err = store
            .try_acquire(&key("a"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LockStoreError::Unavailable(_)));
    }
}
