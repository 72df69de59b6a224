//! Adapters for the engine's storage and notification ports.

pub mod console;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
