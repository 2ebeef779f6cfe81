//! Services built on the ports: locking, identity, gating and capacity.

pub mod gate_policy;
pub mod identity;
pub mod limiter;
pub mod lock_manager;

pub use gate_policy::{GatePolicy, GatedRoute, NEW_CONVERSATION_PATH, TTS_PATH};
pub use identity::{CredentialKind, CredentialSource, extract_user_id, split_subprotocols};
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use lock_manager::{LockError, LockGuard, LockManager, LockManagerConfig, SessionLease};
