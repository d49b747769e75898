use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::{Collection, ListItem};
use crate::services::lists::ListStore;

/// Several lists read in one round trip
#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub synced_at: DateTime<Utc>,
    #[serde(flatten)]
    pub lists: BTreeMap<Collection, Vec<ListItem>>,
}

/// Maps requested names to collections
///
/// Names are trimmed and lower-cased, duplicates collapse and unknown names
/// are dropped. Nothing requested means every collection.
pub fn resolve_requested(names: &[String]) -> Vec<Collection> {
    if names.iter().all(|name| name.trim().is_empty()) {
        return Collection::ALL.to_vec();
    }

    let mut resolved = Vec::new();
    for name in names {
        let name = name.trim().to_lowercase();
        match name.parse::<Collection>() {
            Ok(collection) if !resolved.contains(&collection) => resolved.push(collection),
            Ok(_) => {}
            Err(_) if name.is_empty() => {}
            Err(_) => tracing::debug!(name = %name, "Ignoring unknown collection in batch read"),
        }
    }
    resolved
}

/// Collects requested names from query pairs
///
/// Accepts repeated `key=` and `keys=` / `keys[]=`, where a value may also be a
/// JSON array string such as `["ratings","parked"]`.
pub fn requested_from_query(pairs: &[(String, String)]) -> Vec<String> {
    let mut names = Vec::new();
    for (param, value) in pairs {
        match param.as_str() {
            "key" => names.push(value.clone()),
            "keys" | "keys[]" => {
                match serde_json::from_str::<Vec<String>>(value) {
                    Ok(list) => names.extend(list),
                    Err(_) => names.push(value.clone()),
                }
            }
            _ => {}
        }
    }
    names
}

/// Reads the requested collections concurrently
pub async fn read_batch(lists: &ListStore, names: &[String]) -> AppResult<BatchSnapshot> {
    let requested = resolve_requested(names);
    tracing::debug!(count = requested.len(), "Batch read");

    let reads = requested.iter().map(|collection| async move {
        let items = lists.read(*collection).await?;
        Ok::<_, AppError>((*collection, items))
    });
    let by_collection = try_join_all(reads).await?.into_iter().collect();

    Ok(BatchSnapshot {
        synced_at: Utc::now(),
        lists: by_collection,
    })
}
