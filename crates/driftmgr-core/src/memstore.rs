//! Default `StateStore` for tests and standalone runs: an in-memory cache.
//! A real deployment swaps this for its own sqlx/object-store-backed
//! implementation behind the same trait; THE CORE never knows the
//! difference.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use crate::boundary::StateStore;
use crate::error::DriftError;

pub struct InMemoryStateStore {
    cache: Cache<String, serde_json::Value>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(Duration::from_secs(24 * 3600))
                .build(),
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), DriftError> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DriftError> {
        Ok(self.cache.get(key).await)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, DriftError> {
        Ok(self
            .cache
            .iter()
            .filter_map(|(k, _)| k.starts_with(prefix).then(|| (*k).clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_value_by_key() {
        let store = InMemoryStateStore::new();
        store.save("inventory:1", serde_json::json!({"a": 1})).await.unwrap();
        let loaded = store.load("inventory:1").await.unwrap();
        assert_eq!(loaded, Some(serde_json::json!({"a": 1})));
    }

    #[tokio::test]
    async fn lists_keys_by_namespace_prefix() {
        let store = InMemoryStateStore::new();
        store.save("plan:a", serde_json::json!(1)).await.unwrap();
        store.save("plan:b", serde_json::json!(2)).await.unwrap();
        store.save("drift:c", serde_json::json!(3)).await.unwrap();

        let mut keys = store.list("plan:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["plan:a".to_string(), "plan:b".to_string()]);
    }
}
