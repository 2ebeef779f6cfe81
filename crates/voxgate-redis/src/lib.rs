#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod store;

pub use store::{RedisConfigError, RedisLockStore};
