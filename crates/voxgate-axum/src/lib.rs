#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by integration tests only
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod speech;
pub mod state;

// Re-export primary types
pub use bootstrap::{
    AxumContext, CorsConfig, LockStoreBackend, ServerConfig, bootstrap, start_server,
};
pub use error::HttpError;
pub use middleware::lock_gate;
pub use routes::create_router;
pub use state::AppState;
