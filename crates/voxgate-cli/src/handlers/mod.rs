//! Command handlers.

pub mod check_config;
pub mod issue_token;
pub mod serve;
