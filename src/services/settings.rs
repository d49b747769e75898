use chrono::Utc;
use serde_json::Value;

use crate::db::{KvStore, StoreKey};
use crate::error::{AppError, AppResult};
use crate::models::settings::default_document;
use crate::models::Settings;

/// The stored settings document as-is, or the defaults when there is none
///
/// A document that is not valid JSON is treated as absent.
pub async fn load_settings_document(store: &dyn KvStore) -> AppResult<Value> {
    match store.get(StoreKey::Settings).await? {
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(Value::Object(document)),
            Ok(_) | Err(_) => {
                tracing::warn!("Stored settings are not a JSON object, using defaults");
                Ok(default_document())
            }
        },
        None => Ok(default_document()),
    }
}

/// Typed settings, falling back to defaults field by field
///
/// A document that does not fit the typed shape at all yields the built-in
/// defaults.
pub async fn load_settings(store: &dyn KvStore) -> AppResult<Settings> {
    let document = load_settings_document(store).await?;
    match serde_json::from_value(document) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!(error = %e, "Stored settings do not match the expected shape, using defaults");
            Ok(Settings::default())
        }
    }
}

/// Recursive merge: objects merge key by key, anything else replaces
pub fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_json(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Merges `patch` into the stored settings and persists the result
///
/// Sections this service does not know about are kept. The merged document
/// must still read as `Settings`, otherwise nothing is written.
pub async fn patch_settings(store: &dyn KvStore, patch: Value) -> AppResult<Value> {
    let Value::Object(patch) = patch else {
        return Err(AppError::Validation("Invalid payload".to_string()));
    };

    let mut document = load_settings_document(store).await?;
    merge_json(&mut document, Value::Object(patch));

    if let Err(e) = serde_json::from_value::<Settings>(document.clone()) {
        return Err(AppError::Validation(format!("Invalid settings: {}", e)));
    }

    if let Value::Object(fields) = &mut document {
        fields.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }

    store.put_json(StoreKey::Settings, &document).await?;
    tracing::info!("Settings updated");
    Ok(document)
}
