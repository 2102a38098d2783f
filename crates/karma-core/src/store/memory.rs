//! In-memory property store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::KarmaResult;
use crate::traits::PropertyStore;
use crate::types::Scope;

/// Property store kept entirely in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryPropertyStore {
    properties: Mutex<BTreeMap<(Scope, String), String>>,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored properties across all scopes.
    pub fn len(&self) -> usize {
        self.properties.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a property from exactly this scope, without the global fallback.
    pub fn get_exact(&self, key: &str, scope: &Scope) -> Option<String> {
        self.properties
            .lock()
            .unwrap()
            .get(&(scope.clone(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn get(&self, key: &str, scope: &Scope) -> KarmaResult<Option<String>> {
        if let Some(value) = self.get_exact(key, scope) {
            return Ok(Some(value));
        }
        Ok(scope
            .fallback()
            .and_then(|fallback| self.get_exact(key, &fallback)))
    }

    async fn set(&self, key: &str, scope: &Scope, value: &str) -> KarmaResult<()> {
        self.properties
            .lock()
            .unwrap()
            .insert((scope.clone(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn unset(&self, key: &str, scope: &Scope) -> KarmaResult<()> {
        self.properties
            .lock()
            .unwrap()
            .remove(&(scope.clone(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_unset() {
        let store = InMemoryPropertyStore::new();
        let scope = Scope::network("oftc");

        assert_eq!(store.get("k", &scope).await.unwrap(), None);
        store.set("k", &scope, "3").await.unwrap();
        assert_eq!(store.get("k", &scope).await.unwrap().as_deref(), Some("3"));

        store.unset("k", &scope).await.unwrap();
        assert_eq!(store.get("k", &scope).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_network_falls_back_to_global() {
        let store = InMemoryPropertyStore::new();
        store.set("k", &Scope::Global, "7").await.unwrap();

        let scope = Scope::network("oftc");
        assert_eq!(store.get("k", &scope).await.unwrap().as_deref(), Some("7"));
        assert_eq!(store.get_exact("k", &scope), None);

        store.set("k", &scope, "2").await.unwrap();
        assert_eq!(store.get("k", &scope).await.unwrap().as_deref(), Some("2"));
        assert_eq!(
            store.get("k", &Scope::Global).await.unwrap().as_deref(),
            Some("7")
        );
    }
}
