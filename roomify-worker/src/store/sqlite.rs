//! SQLite-backed store
//!
//! One row per (namespace, key); values are JSON text.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use super::{KvStore, StoreError};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv_entries (
    namespace TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (namespace, key)
)";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) a database file
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("Opened project store at {}", db_path.display());
        Self::from_pool(pool).await
    }

    /// Private in-memory database
    ///
    /// Pinned to a single never-expiring connection: every SQLite in-memory
    /// connection is a separate database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(&value)?;

        sqlx::query(
            "INSERT INTO kv_entries (namespace, key, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(namespace, key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(namespace)
        .bind(key)
        .bind(text)
        .bind(roomify_common::time::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_entries WHERE namespace = ? AND key = ?")
                .bind(namespace)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((text,)) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM kv_entries WHERE namespace = ?")
            .bind(namespace)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set("u1", "roomify_project_p1", json!({"v": 1})).await.unwrap();
        store.set("u1", "roomify_project_p1", json!({"v": 2})).await.unwrap();

        let value = store.get("u1", "roomify_project_p1").await.unwrap();
        assert_eq!(value, Some(json!({"v": 2})));
        assert_eq!(store.list_keys("u1").await.unwrap(), vec!["roomify_project_p1"]);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.get("u1", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_row_reports_key() {
        let store = SqliteStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO kv_entries VALUES ('u1', 'bad', '{not json', 'now')")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store.get("u1", "bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "bad"));
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("roomify.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store.set("u1", "k", json!("kept")).await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("u1", "k").await.unwrap(), Some(json!("kept")));
    }
}
