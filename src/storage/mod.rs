//! Durable key-value storage
//!
//! The timer persists its snapshot through the `KeyValueStore` trait. The
//! binary uses `FileStore`; tests use `MemoryStore`.

pub mod file_store;
pub mod memory_store;

use async_trait::async_trait;

use crate::error::StorageError;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// String key-value store with async reads and writes
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
