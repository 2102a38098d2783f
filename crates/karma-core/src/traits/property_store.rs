//! Property store trait.

use async_trait::async_trait;

use crate::error::KarmaResult;
use crate::types::Scope;

/// Key-value property storage, the persistence contract karma is kept in.
///
/// `get` on a network scope falls back to the global scope when the network
/// has no value for the key. `set` and `unset` only touch the scope given.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Read a property.
    async fn get(&self, key: &str, scope: &Scope) -> KarmaResult<Option<String>>;

    /// Write a property.
    async fn set(&self, key: &str, scope: &Scope, value: &str) -> KarmaResult<()>;

    /// Remove a property. Removing an absent property is not an error.
    async fn unset(&self, key: &str, scope: &Scope) -> KarmaResult<()>;
}
