use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};
use crate::models::Collection;

/// The well-known keys. One key per document, never one key per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Settings,
    List(Collection),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::Settings => write!(f, "settings"),
            StoreKey::List(collection) => write!(f, "{}", collection),
        }
    }
}

/// Remote key-value store holding JSON documents
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the raw document stored under `key`, if any
    async fn get(&self, key: StoreKey) -> AppResult<Option<String>>;

    /// Replaces the document stored under `key`
    async fn put(&self, key: StoreKey, value: String) -> AppResult<()>;

    /// Backend name for logging and diagnostics
    fn backend(&self) -> &'static str;
}

impl<'a> dyn KvStore + 'a {
    /// Reads and deserializes a document
    pub async fn get_json<T: DeserializeOwned>(&self, key: StoreKey) -> AppResult<Option<T>> {
        match self.get(key).await? {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    tracing::error!(key = %key, error = %e, "Stored document is not valid JSON");
                    AppError::Internal(format!("Corrupt document under '{}': {}", key, e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Serializes and writes a document
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
        self.put(key, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_key_display_settings() {
        assert_eq!(format!("{}", StoreKey::Settings), "settings");
    }

    #[test]
    fn test_store_key_display_lists() {
        assert_eq!(format!("{}", StoreKey::List(Collection::Ratings)), "ratings");
        assert_eq!(format!("{}", StoreKey::List(Collection::Parked)), "parked");
        assert_eq!(format!("{}", StoreKey::List(Collection::Rejects)), "rejects");
    }
}
