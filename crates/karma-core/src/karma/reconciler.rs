//! Karma reconciler.
//!
//! A karma record is three independent properties: the legacy net value
//! (`karma_<object>`) and the cumulative `upkarma_<object>` /
//! `downkarma_<object>` counters. Older data may only have the legacy value,
//! and a partially failed write may leave the three out of step. Every read
//! brings `up - down` back in line with the legacy value by raising whichever
//! counter falls short; counters are never lowered.
//!
//! Storage failures are never fatal here. A failed read counts as zero, a
//! failed write is reported and the in-memory result is returned anyway; the
//! next read heals whatever was left behind.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::KarmaError;
use crate::traits::PropertyStore;
use crate::types::{KarmaCount, KarmaKeys, Scope, Sign};

/// Result of a reconciler operation: the counters, plus every storage error
/// that was tolerated along the way.
#[derive(Debug, Default)]
pub struct KarmaOutcome {
    pub karma: KarmaCount,
    pub errors: Vec<KarmaError>,
}

impl KarmaOutcome {
    /// Whether every storage operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Bring raw `(up, down)` counters in line with the legacy net value.
///
/// At most one counter is raised, and only by the shortfall. The arithmetic
/// is done in `i128` and a counter that would pass `i64::MAX` stops there.
pub fn reconcile(current: i64, raw: KarmaCount) -> KarmaCount {
    let naive = i128::from(raw.up) - i128::from(raw.down);
    let current = i128::from(current);
    let mut karma = raw;
    if current < naive {
        karma.down = raise(karma.down, naive - current);
    } else if current > naive {
        karma.up = raise(karma.up, current - naive);
    }
    karma
}

fn raise(counter: i64, by: i128) -> i64 {
    i64::try_from(i128::from(counter) + by).unwrap_or(i64::MAX)
}

/// Reads and updates karma records in a [`PropertyStore`].
#[derive(Clone)]
pub struct KarmaReconciler {
    store: Arc<dyn PropertyStore>,
    prefix: String,
}

impl KarmaReconciler {
    /// Create a reconciler that prefixes every key with `prefix`.
    pub fn new(store: Arc<dyn PropertyStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Storage keys for an object.
    pub fn keys(&self, object: &str) -> KarmaKeys {
        KarmaKeys::new(&self.prefix, object)
    }

    /// Read the consistent `(up, down)` pair for an object.
    pub async fn get_karma(&self, scope: &Scope, object: &str) -> KarmaOutcome {
        let keys = self.keys(object);
        let mut errors = Vec::new();

        let current = self.read_counter(&keys.current, scope, &mut errors).await;
        let up = self.read_count(&keys.up, scope, &mut errors).await;
        let down = self.read_count(&keys.down, scope, &mut errors).await;

        let raw = KarmaCount::new(up, down);
        let karma = reconcile(current, raw);
        if karma != raw {
            debug!(
                scope = %scope,
                object = %object,
                current,
                raw_up = up,
                raw_down = down,
                up = karma.up,
                down = karma.down,
                "Reconciled karma counters with legacy value"
            );
        }

        KarmaOutcome { karma, errors }
    }

    /// Apply one vote and persist the result.
    ///
    /// `up` and `down` are always written. The legacy value is written when
    /// the net is non-zero and removed otherwise, in this scope and in the
    /// global scope, so a stale global entry cannot resurface through the
    /// network-to-global fallback.
    pub async fn modify_karma(&self, scope: &Scope, object: &str, sign: Sign) -> KarmaOutcome {
        let KarmaOutcome {
            mut karma,
            mut errors,
        } = self.get_karma(scope, object).await;
        karma.apply(sign);

        let keys = self.keys(object);
        let writes = [
            (&keys.up, karma.up.to_string()),
            (&keys.down, karma.down.to_string()),
        ];
        for (key, value) in writes {
            if let Err(e) = self.store.set(key, scope, &value).await {
                error!(key = %key, scope = %scope, "Failed to write karma property: {}", e);
                errors.push(e);
            }
        }

        let net = karma.net();
        if net == 0 {
            let mut scopes = vec![scope.clone()];
            if let Some(fallback) = scope.fallback() {
                scopes.push(fallback);
            }
            for target in &scopes {
                if let Err(e) = self.store.unset(&keys.current, target).await {
                    error!(
                        key = %keys.current,
                        scope = %target,
                        "Failed to unset karma property: {}",
                        e
                    );
                    errors.push(e);
                }
            }
        } else if let Err(e) = self
            .store
            .set(&keys.current, scope, &net.to_string())
            .await
        {
            error!(
                key = %keys.current,
                scope = %scope,
                "Failed to write karma property: {}",
                e
            );
            errors.push(e);
        }

        KarmaOutcome { karma, errors }
    }

    /// Read an up or down count. These only ever grow from zero, so a
    /// negative value is treated like any other unreadable one.
    async fn read_count(&self, key: &str, scope: &Scope, errors: &mut Vec<KarmaError>) -> i64 {
        let count = self.read_counter(key, scope, errors).await;
        if count < 0 {
            warn!(key = %key, scope = %scope, count, "Karma count is negative");
            errors.push(KarmaError::storage_read(
                key,
                format!("count {} is negative", count),
            ));
            return 0;
        }
        count
    }

    async fn read_counter(&self, key: &str, scope: &Scope, errors: &mut Vec<KarmaError>) -> i64 {
        let raw = match self.store.get(key, scope).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, scope = %scope, "Failed to read karma property: {}", e);
                errors.push(e);
                return 0;
            }
        };

        match raw {
            None => 0,
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(
                    key = %key,
                    scope = %scope,
                    value = %value,
                    "Karma property is not an integer"
                );
                errors.push(KarmaError::storage_read(
                    key,
                    format!("'{}' is not an integer", value),
                ));
                0
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPropertyStore;
    use crate::traits::MockPropertyStore;

    const PREFIX: &str = "perl.DazKarma.";

    fn setup() -> (Arc<InMemoryPropertyStore>, KarmaReconciler) {
        let store = Arc::new(InMemoryPropertyStore::new());
        let reconciler = KarmaReconciler::new(store.clone(), PREFIX);
        (store, reconciler)
    }

    async fn seed(store: &InMemoryPropertyStore, scope: &Scope, fields: &[(&str, &str)]) {
        for (field, value) in fields {
            let key = format!("{}{}_rust", PREFIX, field);
            store.set(&key, scope, value).await.unwrap();
        }
    }

    #[test]
    fn test_reconcile_rules() {
        // Consistent already.
        assert_eq!(reconcile(2, KarmaCount::new(3, 1)), KarmaCount::new(3, 1));
        // Legacy-only positive value.
        assert_eq!(reconcile(5, KarmaCount::new(0, 0)), KarmaCount::new(5, 0));
        // Legacy-only negative value.
        assert_eq!(reconcile(-3, KarmaCount::new(0, 0)), KarmaCount::new(0, 3));
        // Legacy value removed at neutral but counters left unequal.
        assert_eq!(reconcile(0, KarmaCount::new(4, 1)), KarmaCount::new(4, 4));
        assert_eq!(reconcile(0, KarmaCount::new(1, 4)), KarmaCount::new(4, 4));
    }

    #[test]
    fn test_reconcile_only_raises() {
        for current in -6..=6 {
            for up in 0..=4 {
                for down in 0..=4 {
                    let raw = KarmaCount::new(up, down);
                    let karma = reconcile(current, raw);
                    assert_eq!(karma.net(), current);
                    assert!(karma.up >= up && karma.down >= down);
                    assert_eq!(reconcile(current, karma), karma);
                }
            }
        }
    }

    #[test]
    fn test_reconcile_extreme_values_saturate() {
        let karma = reconcile(i64::MIN, KarmaCount::new(5, 0));
        assert_eq!(karma, KarmaCount::new(5, i64::MAX));

        let karma = reconcile(i64::MAX, KarmaCount::new(0, i64::MAX));
        assert_eq!(karma, KarmaCount::new(i64::MAX, i64::MAX));
    }

    #[tokio::test]
    async fn test_huge_stored_values_do_not_overflow() {
        let scope = Scope::network("oftc");

        let (store, reconciler) = setup();
        let max = i64::MAX.to_string();
        seed(&store, &scope, &[("karma", max.as_str()), ("upkarma", max.as_str())]).await;
        let outcome = reconciler.modify_karma(&scope, "rust", Sign::Increase).await;
        assert_eq!(outcome.karma, KarmaCount::new(i64::MAX, 0));
        assert!(outcome.is_clean());

        let (store, reconciler) = setup();
        let min = i64::MIN.to_string();
        seed(&store, &scope, &[("karma", min.as_str()), ("upkarma", "5")]).await;
        let outcome = reconciler.get_karma(&scope, "rust").await;
        assert_eq!(outcome.karma, KarmaCount::new(5, i64::MAX));
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_negative_count_is_read_error() {
        let (store, reconciler) = setup();
        let scope = Scope::network("oftc");
        seed(&store, &scope, &[("karma", "2"), ("upkarma", "-3"), ("downkarma", "-1")]).await;

        let outcome = reconciler.get_karma(&scope, "rust").await;
        assert_eq!(outcome.karma, KarmaCount::new(2, 0));
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome
            .errors
            .iter()
            .all(|e| matches!(e, KarmaError::StorageRead { .. })));
    }

    #[tokio::test]
    async fn test_get_karma_missing_is_neutral() {
        let (_store, reconciler) = setup();
        let outcome = reconciler.get_karma(&Scope::network("oftc"), "bar").await;
        assert_eq!(outcome.karma, KarmaCount::default());
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_get_karma_heals_legacy_record() {
        let (store, reconciler) = setup();
        let scope = Scope::network("oftc");
        seed(&store, &scope, &[("karma", "7"), ("upkarma", "2")]).await;

        let first = reconciler.get_karma(&scope, "Rust").await;
        assert_eq!(first.karma, KarmaCount::new(7, 0));

        let second = reconciler.get_karma(&scope, "rust").await;
        assert_eq!(second.karma, first.karma);
    }

    #[tokio::test]
    async fn test_modify_karma_writes_all_fields() {
        let (store, reconciler) = setup();
        let scope = Scope::network("oftc");

        let outcome = reconciler.modify_karma(&scope, "Rust", Sign::Increase).await;
        assert_eq!(outcome.karma, KarmaCount::new(1, 0));
        assert!(outcome.is_clean());

        let keys = reconciler.keys("rust");
        assert_eq!(store.get_exact(&keys.current, &scope).as_deref(), Some("1"));
        assert_eq!(store.get_exact(&keys.up, &scope).as_deref(), Some("1"));
        assert_eq!(store.get_exact(&keys.down, &scope).as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_modify_round_trip_restores_net() {
        let (store, reconciler) = setup();
        let scope = Scope::network("oftc");
        seed(&store, &scope, &[("karma", "3"), ("upkarma", "5"), ("downkarma", "2")]).await;

        reconciler.modify_karma(&scope, "rust", Sign::Increase).await;
        let outcome = reconciler.modify_karma(&scope, "rust", Sign::Decrease).await;
        assert_eq!(outcome.karma, KarmaCount::new(6, 3));
        assert_eq!(outcome.karma.net(), 3);
    }

    #[tokio::test]
    async fn test_neutral_clears_legacy_value_in_both_scopes() {
        let (store, reconciler) = setup();
        let scope = Scope::network("oftc");
        seed(&store, &Scope::Global, &[("karma", "4")]).await;
        seed(&store, &scope, &[("karma", "1"), ("upkarma", "1"), ("downkarma", "0")]).await;

        let outcome = reconciler.modify_karma(&scope, "rust", Sign::Decrease).await;
        assert_eq!(outcome.karma, KarmaCount::new(1, 1));

        let keys = reconciler.keys("rust");
        assert_eq!(store.get_exact(&keys.current, &scope), None);
        assert_eq!(store.get_exact(&keys.current, &Scope::Global), None);
        assert_eq!(store.get_exact(&keys.up, &scope).as_deref(), Some("1"));
        assert_eq!(store.get_exact(&keys.down, &scope).as_deref(), Some("1"));

        // Neutral stays neutral on the next read.
        let again = reconciler.get_karma(&scope, "rust").await;
        assert_eq!(again.karma, KarmaCount::new(1, 1));
    }

    #[tokio::test]
    async fn test_garbage_value_counts_as_zero() {
        let (store, reconciler) = setup();
        let scope = Scope::network("oftc");
        seed(&store, &scope, &[("karma", "lots"), ("upkarma", " 2 ")]).await;

        let outcome = reconciler.get_karma(&scope, "rust").await;
        assert_eq!(outcome.karma, KarmaCount::new(2, 2));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_defaults_to_zero() {
        let mut store = MockPropertyStore::new();
        store
            .expect_get()
            .returning(|key, _| Err(KarmaError::storage_read(key, "socket timeout")));
        store.expect_set().times(3).returning(|_, _, _| Ok(()));

        let reconciler = KarmaReconciler::new(Arc::new(store), PREFIX);
        let outcome = reconciler
            .modify_karma(&Scope::network("oftc"), "rust", Sign::Increase)
            .await;

        assert_eq!(outcome.karma, KarmaCount::new(1, 0));
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.iter().all(|e| !e.is_fatal()));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_in_memory_values() {
        let mut store = MockPropertyStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        store
            .expect_set()
            .withf(|key, _, _| key.contains("downkarma_"))
            .returning(|key, _, _| Err(KarmaError::storage_write(key, "read-only")));
        store
            .expect_set()
            .withf(|key, _, _| !key.contains("downkarma_"))
            .times(2)
            .returning(|_, _, _| Ok(()));

        let reconciler = KarmaReconciler::new(Arc::new(store), PREFIX);
        let scope = Scope::network("oftc");
        let outcome = reconciler.modify_karma(&scope, "rust", Sign::Decrease).await;

        assert_eq!(outcome.karma, KarmaCount::new(0, 1));
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], KarmaError::StorageWrite { .. }));
    }
}
