//! Redis-backed [`LockStore`].
//!
//! Every instance sharing a Redis server shares the lock namespace, which is
//! what makes the per-user lock hold across processes.

use std::time::Duration;

use async_trait::async_trait;
use redis::{Client, RedisError, aio::MultiplexedConnection};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use voxgate_core::domain::LockKey;
use voxgate_core::ports::{LockStore, LockStoreError};

/// Value stored under a lock key. Only existence matters.
const LOCK_SENTINEL: &str = "1";

/// Invalid Redis connection settings.
#[derive(Debug, Error)]
pub enum RedisConfigError {
    #[error("Invalid Redis URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Lock store over one lazily opened multiplexed Redis connection.
pub struct RedisLockStore {
    client: Client,
    url: String,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisLockStore {
    /// Create a store for `url` (e.g. `redis://localhost:6379/0`).
    ///
    /// No connection is made until the first command.
    pub fn new(url: &str) -> Result<Self, RedisConfigError> {
        let client = Client::open(url).map_err(|e| RedisConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            url: url.to_string(),
            conn: Mutex::new(None),
        })
    }

    /// Create a store from host, port and database index.
    pub fn with_host_port(host: &str, port: u16, db: u32) -> Result<Self, RedisConfigError> {
        Self::new(&format!("redis://{host}:{port}/{db}"))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The shared connection, opening it on first use.
    async fn connection(&self) -> Result<MultiplexedConnection, LockStoreError> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to connect to Redis");
                LockStoreError::Unavailable(e.to_string())
            })?;
        info!("Connected to Redis lock store");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Map a command error, dropping the cached connection if it is dead.
    async fn command_failed(&self, op: &str, err: &RedisError) -> LockStoreError {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            *self.conn.lock().await = None;
            debug!(op, "Discarded broken Redis connection");
        }
        LockStoreError::Unavailable(format!("Redis {op} failed: {err}"))
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn try_acquire(&self, key: &LockKey, ttl: Duration) -> Result<bool, LockStoreError> {
        let mut conn = self.connection().await?;
        // Redis rejects EX 0.
        let ttl_secs = ttl.as_secs().max(1);

        let reply: Result<Option<String>, RedisError> = redis::cmd("SET")
            .arg(key.as_str())
            .arg(LOCK_SENTINEL)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await;

        match reply {
            Ok(Some(status)) if status == "OK" => Ok(true),
            Ok(Some(other)) => Err(LockStoreError::Protocol(format!(
                "SET NX replied '{other}'"
            ))),
            Ok(None) => Ok(false),
            Err(e) => Err(self.command_failed("SET", &e).await),
        }
    }

    async fn release(&self, key: &LockKey) -> Result<(), LockStoreError> {
        let mut conn = self.connection().await?;
        let reply: Result<i64, RedisError> = redis::cmd("DEL")
            .arg(key.as_str())
            .query_async(&mut conn)
            .await;

        match reply {
            Ok(removed) => {
                if removed == 0 {
                    debug!(key = %key, "Lock record already gone on release");
                }
                Ok(())
            }
            Err(e) => Err(self.command_failed("DEL", &e).await),
        }
    }

    async fn ping(&self) -> Result<(), LockStoreError> {
        let mut conn = self.connection().await?;
        let reply: Result<String, RedisError> = redis::cmd("PING").query_async(&mut conn).await;
        match reply {
            Ok(_) => Ok(()),
            Err(e) => Err(self.command_failed("PING", &e).await),
        }
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            info!("Closed Redis lock store connection");
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
