//! Key-value store backing the project records
//!
//! Records are namespaced per user: every authenticated user sees their own
//! key space, mirroring a user-bound hosted key-value service. Within a
//! namespace `set`/`get` are atomic per key and concurrent writers are
//! last-write-wins.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt value for key {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Minimal key-value contract used by the project handlers
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store (or overwrite) a value
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError>;

    /// Fetch a value, `None` when the key is absent
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Enumerate all keys of a namespace, in backend order
    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StoreError>;
}
