#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod jwt;

pub use jwt::{DEFAULT_LEEWAY_SECS, JwtError, JwtVerifier};
