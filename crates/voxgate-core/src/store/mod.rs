//! Lock store implementations that need no external infrastructure.

pub mod memory;

pub use memory::MemoryLockStore;
