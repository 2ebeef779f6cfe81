//! Domain types shared by every voxgate crate.

pub mod lock;
pub mod retry;

pub use lock::{IdentityError, LockKey, LockName, UserId};
pub use retry::RetryPolicy;
