use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::MediaType;

/// A title stored in one of the user lists
///
/// `canonical_key` is the identity. Everything else is caller-supplied and
/// passed through; fields this service does not interpret end up in `extra`
/// and are written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub canonical_key: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crew: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListItem {
    pub fn new(canonical_key: impl Into<String>) -> Self {
        Self {
            canonical_key: canonical_key.into(),
            media_type: None,
            genres: Vec::new(),
            rating: None,
            rated_at: None,
            added_at: None,
            cast: Vec::new(),
            crew: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Lenient read of an item already in the store
    ///
    /// A typed field whose value does not fit stays in `extra` as it was, so
    /// the item is written back unchanged. Ratings stored as numeric strings
    /// are read as numbers. Returns `None` for anything but a JSON object.
    pub fn from_stored(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };

        let canonical_key = match fields.get("canonical_key") {
            Some(Value::Number(n)) => {
                let key = n.to_string();
                fields.remove("canonical_key");
                key
            }
            _ => take_field(&mut fields, "canonical_key").unwrap_or_default(),
        };
        let rating = match fields.get("rating") {
            Some(Value::String(raw)) => match raw.trim().replace(',', ".").parse::<f64>() {
                Ok(rating) if rating.is_finite() => {
                    fields.remove("rating");
                    Some(rating)
                }
                _ => None,
            },
            _ => take_field(&mut fields, "rating"),
        };

        Some(Self {
            canonical_key,
            media_type: take_field(&mut fields, "type"),
            genres: take_field(&mut fields, "genres").unwrap_or_default(),
            rating,
            rated_at: take_field(&mut fields, "rated_at"),
            added_at: take_field(&mut fields, "added_at"),
            cast: take_field(&mut fields, "cast").unwrap_or_default(),
            crew: take_field(&mut fields, "crew").unwrap_or_default(),
            extra: fields,
        })
    }
}

/// Moves `name` out of `fields` only when it parses as `T`
fn take_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, name: &str) -> Option<T> {
    let parsed = serde_json::from_value(fields.get(name)?.clone()).ok()?;
    fields.remove(name);
    Some(parsed)
}
