use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::db::{KvStore, StoreKey};
use crate::error::AppResult;

/// Process-local store, used for local runs and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(&key.to_string()).cloned())
    }

    async fn put(&self, key: StoreKey, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Collection;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(StoreKey::Settings).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_helpers_round_trip() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let key = StoreKey::List(Collection::Parked);

        store.put_json(key, &vec!["a", "b"]).await.unwrap();
        let read: Option<Vec<String>> = store.get_json(key).await.unwrap();
        assert_eq!(read, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_corrupt_document_is_an_internal_error() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let key = StoreKey::List(Collection::Ratings);

        tokio_test::block_on(async {
            store.put(key, "{not json".to_string()).await.unwrap();
            let result: AppResult<Option<Vec<String>>> = store.get_json(key).await;
            assert!(matches!(result, Err(crate::error::AppError::Internal(_))));
        });
    }
}
