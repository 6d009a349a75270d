//! In-memory store, used when no database path is configured

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{KvStore, StoreError};

/// HashMap-backed store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    namespaces: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}
