//! SQLite storage driver
//!
//! Persists namespaced JSON values in a single `kv_items` table.

use super::{KvStorage, StorageError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

/// Key-value storage backed by a SQLite connection pool
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) the database and apply migrations
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(SqliteStorage)` if successful
    /// * `Err(StorageError)` if the database could not be opened
    pub async fn new(db_path: &Path) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create db directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path.display());

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Apply the bundled schema, one statement at a time
    async fn run_migrations(&self) -> Result<(), StorageError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_kv_items.sql");

        for statement in split_statements(migration_sql) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Strip `--` comments and split a migration script into statements
fn split_statements(sql: &str) -> Vec<String> {
    let mut cleaned_sql = String::new();
    for line in sql.lines() {
        let without_comments = match line.find("--") {
            Some(comment_pos) => &line[..comment_pos],
            None => line,
        };
        let trimmed = without_comments.trim();
        if trimmed.is_empty() {
            continue;
        }
        cleaned_sql.push_str(trimmed);
        cleaned_sql.push(' ');
    }

    cleaned_sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl KvStorage for SqliteStorage {
    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT key FROM kv_items WHERE namespace = ? ORDER BY key ASC",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let raw = sqlx::query_scalar::<_, String>(
            "SELECT value FROM kv_items WHERE namespace = ? AND key = ?",
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|e| StorageError::Corrupt {
                namespace: namespace.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    async fn set_item(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        let text = serde_json::to_string(&value)?;
        let updated_at = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO kv_items (namespace, key, value, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(namespace)
        .bind(key)
        .bind(text)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        debug!(namespace, key, "Stored item");
        Ok(())
    }

    async fn remove_item(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM kv_items WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(namespace, key, "Removed item");
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn create_test_storage() -> (SqliteStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SqliteStorage::new(&db_path)
            .await
            .expect("Failed to create test database");
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn test_path_with_url_characters() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("odd?name#dir").join("chats.db");
        let storage = SqliteStorage::new(&db_path).await.unwrap();
        storage.set_item("chats", "a", json!({})).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(storage.list_keys("chats").await.unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_split_statements_drops_comments() {
        let sql = "-- header\nCREATE TABLE t (a TEXT); -- trailing\n\nCREATE INDEX i ON t(a);\n";
        let statements = split_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE t (a TEXT)".to_string(),
                "CREATE INDEX i ON t(a)".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let (storage, _temp_dir) = create_test_storage().await;
        let value = json!({"id": "a", "title": "Hello"});
        storage.set_item("chats", "a", value.clone()).await.unwrap();
        assert_eq!(storage.get_item("chats", "a").await.unwrap(), Some(value));
        assert!(storage.get_item("chats", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_per_namespace() {
        let (storage, _temp_dir) = create_test_storage().await;
        storage.set_item("chats", "b", json!({})).await.unwrap();
        storage.set_item("chats", "a", json!({})).await.unwrap();
        storage.set_item("other", "z", json!({})).await.unwrap();

        assert_eq!(
            storage.list_keys("chats").await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let (storage, _temp_dir) = create_test_storage().await;
        storage
            .set_item("chats", "a", json!({"title": "one"}))
            .await
            .unwrap();
        storage
            .set_item("chats", "a", json!({"title": "two"}))
            .await
            .unwrap();
        assert_eq!(storage.list_keys("chats").await.unwrap().len(), 1);
        assert_eq!(
            storage.get_item("chats", "a").await.unwrap(),
            Some(json!({"title": "two"}))
        );

        assert!(storage.remove_item("chats", "a").await.unwrap());
        assert!(!storage.remove_item("chats", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let (storage, _temp_dir) = create_test_storage().await;
        sqlx::query(
            "INSERT INTO kv_items (namespace, key, value, updated_at) VALUES ('chats', 'bad', 'not json', 0)",
        )
        .execute(storage.pool())
        .await
        .unwrap();

        match storage.get_item("chats", "bad").await {
            Err(StorageError::Corrupt { key, .. }) => assert_eq!(key, "bad"),
            other => panic!("Expected Corrupt error, got: {:?}", other),
        }
    }
}
