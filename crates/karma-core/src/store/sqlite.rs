//! SQLite-backed property store.
//!
//! Lets the plugin keep karma in a local database instead of the DaZeus
//! core's property store.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{KarmaError, KarmaResult};
use crate::traits::PropertyStore;
use crate::types::Scope;

/// Scope column value for the global scope.
const GLOBAL_SCOPE: &str = "";

/// SQLite-backed property store
pub struct SqlitePropertyStore {
    conn: Mutex<Connection>,
}

impl SqlitePropertyStore {
    /// Open (or create) a store at the given path
    pub fn new(path: impl AsRef<Path>) -> KarmaResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> KarmaResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> KarmaResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                scope TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope, key)
            );
        "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> KarmaResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| KarmaError::database("property store connection poisoned"))
    }

    fn scope_column(scope: &Scope) -> &str {
        scope.network_name().unwrap_or(GLOBAL_SCOPE)
    }

    fn get_exact(&self, key: &str, scope: &Scope) -> KarmaResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM properties WHERE scope = ?1 AND key = ?2",
                params![Self::scope_column(scope), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

#[async_trait]
impl PropertyStore for SqlitePropertyStore {
    async fn get(&self, key: &str, scope: &Scope) -> KarmaResult<Option<String>> {
        let read = |scope: &Scope| {
            self.get_exact(key, scope)
                .map_err(|e| KarmaError::storage_read(key, e.to_string()))
        };
        match read(scope)? {
            Some(value) => Ok(Some(value)),
            None => match scope.fallback() {
                Some(fallback) => read(&fallback),
                None => Ok(None),
            },
        }
    }

    async fn set(&self, key: &str, scope: &Scope, value: &str) -> KarmaResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"INSERT INTO properties (scope, key, value) VALUES (?1, ?2, ?3)
               ON CONFLICT (scope, key) DO UPDATE SET value = excluded.value"#,
            params![Self::scope_column(scope), key, value],
        )
        .map_err(|e| KarmaError::storage_write(key, e.to_string()))?;
        Ok(())
    }

    async fn unset(&self, key: &str, scope: &Scope) -> KarmaResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM properties WHERE scope = ?1 AND key = ?2",
            params![Self::scope_column(scope), key],
        )
        .map_err(|e| KarmaError::storage_write(key, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_property_crud() {
        let store = SqlitePropertyStore::in_memory().unwrap();
        let scope = Scope::network("oftc");

        // Create
        store.set("karma_rust", &scope, "4").await.unwrap();
        assert_eq!(
            store.get("karma_rust", &scope).await.unwrap().as_deref(),
            Some("4")
        );

        // Update
        store.set("karma_rust", &scope, "5").await.unwrap();
        assert_eq!(
            store.get("karma_rust", &scope).await.unwrap().as_deref(),
            Some("5")
        );

        // Delete
        store.unset("karma_rust", &scope).await.unwrap();
        assert_eq!(store.get("karma_rust", &scope).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_global_fallback() {
        let store = SqlitePropertyStore::in_memory().unwrap();
        store.set("karma_perl", &Scope::Global, "-2").await.unwrap();

        let scope = Scope::network("oftc");
        assert_eq!(
            store.get("karma_perl", &scope).await.unwrap().as_deref(),
            Some("-2")
        );

        store.unset("karma_perl", &scope).await.unwrap();
        assert_eq!(
            store.get("karma_perl", &scope).await.unwrap().as_deref(),
            Some("-2")
        );

        store.unset("karma_perl", &Scope::Global).await.unwrap();
        assert_eq!(store.get("karma_perl", &scope).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("karma.db");

        {
            let store = SqlitePropertyStore::new(&path).unwrap();
            store
                .set("upkarma_rust", &Scope::network("oftc"), "9")
                .await
                .unwrap();
        }

        let store = SqlitePropertyStore::new(&path).unwrap();
        assert_eq!(
            store
                .get("upkarma_rust", &Scope::network("oftc"))
                .await
                .unwrap()
                .as_deref(),
            Some("9")
        );
    }
}
