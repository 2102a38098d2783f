//! DaZeus-backed property store.

use async_trait::async_trait;
use karma_core::error::{KarmaError, KarmaResult};
use karma_core::traits::PropertyStore;
use karma_core::types::Scope;

use crate::client::DaZeusClient;

/// Requests the core refused become storage errors; transport failures keep
/// their own (fatal) kind so the event loop notices them.
fn as_storage_error(
    e: KarmaError,
    storage_error: impl FnOnce(String) -> KarmaError,
) -> KarmaError {
    if e.is_fatal() {
        e
    } else {
        storage_error(e.to_string())
    }
}

#[async_trait]
impl PropertyStore for DaZeusClient {
    async fn get(&self, key: &str, scope: &Scope) -> KarmaResult<Option<String>> {
        self.get_property(key, scope)
            .await
            .map_err(|e| as_storage_error(e, |msg| KarmaError::storage_read(key, msg)))
    }

    async fn set(&self, key: &str, scope: &Scope, value: &str) -> KarmaResult<()> {
        self.set_property(key, value, scope)
            .await
            .map_err(|e| as_storage_error(e, |msg| KarmaError::storage_write(key, msg)))
    }

    async fn unset(&self, key: &str, scope: &Scope) -> KarmaResult<()> {
        self.unset_property(key, scope)
            .await
            .map_err(|e| as_storage_error(e, |msg| KarmaError::storage_write(key, msg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn frame(json: &str) -> Vec<u8> {
        format!("{}{}", json.len(), json).into_bytes()
    }

    #[tokio::test]
    async fn test_set_forwards_to_core() {
        let request = r#"{"do":"property","params":["set","perl.DazKarma.upkarma_foo","2"],"scope":["oftc"]}"#;
        let response = r#"{"did":"property","success":true}"#;
        let mock = Builder::new()
            .write(&frame(request))
            .read(&frame(response))
            .build();

        let client = DaZeusClient::from_transport(mock);
        client
            .set("perl.DazKarma.upkarma_foo", &Scope::network("oftc"), "2")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refusal_becomes_storage_error() {
        let request = r#"{"do":"property","params":["get","perl.DazKarma.karma_foo"],"scope":[]}"#;
        let response = r#"{"got":"property","success":false,"error":"database locked"}"#;
        let mock = Builder::new()
            .write(&frame(request))
            .read(&frame(response))
            .build();

        let client = DaZeusClient::from_transport(mock);
        let err = client
            .get("perl.DazKarma.karma_foo", &Scope::Global)
            .await
            .unwrap_err();
        assert!(matches!(err, KarmaError::StorageRead { .. }));
        assert!(err.to_string().contains("database locked"));
    }
}
