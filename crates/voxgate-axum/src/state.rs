//! Shared application state type.

use crate::bootstrap::AxumContext;
use std::sync::Arc;

/// Application state shared by the gate middleware and all handlers.
pub type AppState = Arc<AxumContext>;
