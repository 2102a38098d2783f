//! Factory for the property store selected in configuration.

use std::sync::Arc;

use karma_core::{
    InMemoryPropertyStore, KarmaConfig, KarmaResult, PropertyStore, SqlitePropertyStore,
    StoreBackend,
};
use karma_dazeus::DaZeusClient;
use tracing::{info, warn};

/// Create the property store. The DaZeus backend shares the plugin's
/// connection to the core.
pub fn create_store(
    config: &KarmaConfig,
    client: Arc<DaZeusClient>,
) -> KarmaResult<Arc<dyn PropertyStore>> {
    match config.store.backend {
        StoreBackend::DaZeus => Ok(client),
        StoreBackend::Sqlite => {
            let store = SqlitePropertyStore::new(&config.store.sqlite_path)?;
            info!(
                path = %config.store.sqlite_path.display(),
                "Using SQLite property store"
            );
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory property store, karma will not survive a restart");
            Ok(Arc::new(InMemoryPropertyStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karma_core::{Scope, StoreConfig};

    fn client() -> Arc<DaZeusClient> {
        let (client_side, _core_side) = tokio::io::duplex(64);
        Arc::new(DaZeusClient::from_transport(client_side))
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let config = KarmaConfig {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                ..StoreConfig::default()
            },
            ..KarmaConfig::default()
        };

        let store = create_store(&config, client()).unwrap();
        store.set("k", &Scope::Global, "1").await.unwrap();
        assert_eq!(
            store.get("k", &Scope::network("oftc")).await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn test_sqlite_backend_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("karma.db");
        let config = KarmaConfig {
            store: StoreConfig {
                backend: StoreBackend::Sqlite,
                sqlite_path: path.clone(),
            },
            ..KarmaConfig::default()
        };

        let store = create_store(&config, client()).unwrap();
        store.set("k", &Scope::network("oftc"), "2").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_dazeus_backend_uses_connection() {
        let client = client();
        let store = create_store(&KarmaConfig::default(), client.clone()).unwrap();

        // The core side is gone, so a property read must fail on the connection.
        let err = store.get("k", &Scope::Global).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
