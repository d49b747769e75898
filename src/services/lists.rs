use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::db::{KvStore, StoreKey};
use crate::error::{AppError, AppResult};
use crate::models::{Collection, ListItem};
use crate::services::normalize::normalize_key;

pub const DEFAULT_LIMIT: usize = 1000;
pub const MAX_LIMIT: usize = 5000;

/// Pending inserts before callers start waiting on the queue
const WRITE_QUEUE_CAPACITY: usize = 256;

/// Result of an insert that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    /// Key already in the target collection; nothing written
    Duplicate,
}

/// The three lists as read together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub ratings: Vec<ListItem>,
    pub parked: Vec<ListItem>,
    pub rejects: Vec<ListItem>,
}

impl Collections {
    pub fn get(&self, collection: Collection) -> &Vec<ListItem> {
        match collection {
            Collection::Ratings => &self.ratings,
            Collection::Parked => &self.parked,
            Collection::Rejects => &self.rejects,
        }
    }

    pub fn get_mut(&mut self, collection: Collection) -> &mut Vec<ListItem> {
        match collection {
            Collection::Ratings => &mut self.ratings,
            Collection::Parked => &mut self.parked,
            Collection::Rejects => &mut self.rejects,
        }
    }

    /// Which collection holds `key`, compared in normalized form
    pub fn membership(&self, key: &str) -> Option<Collection> {
        let key = normalize_key(key);
        Collection::ALL.into_iter().find(|collection| {
            self.get(*collection)
                .iter()
                .any(|item| normalize_key(&item.canonical_key) == key)
        })
    }

    /// Normalized keys of every listed title
    pub fn exclusion_set(&self) -> HashSet<String> {
        Collection::ALL
            .iter()
            .flat_map(|collection| self.get(*collection).iter())
            .map(|item| normalize_key(&item.canonical_key))
            .collect()
    }
}

/// Validates a raw insert payload and normalizes its key
///
/// `rating` is checked on the raw JSON so that a present-but-null rating is
/// still refused outside `ratings`.
pub fn validate_item(collection: Collection, payload: Value) -> AppResult<ListItem> {
    let Value::Object(mut fields) = payload else {
        return Err(AppError::Validation("Invalid payload".to_string()));
    };

    let raw_key = match fields.get("canonical_key") {
        Some(Value::String(key)) if !key.trim().is_empty() => key.trim().to_string(),
        _ => {
            return Err(AppError::Validation(
                "canonical_key (non-empty string) required".to_string(),
            ))
        }
    };
    let key = normalize_key(&raw_key);
    if key.is_empty() {
        return Err(AppError::Validation(
            "canonical_key must contain letters or digits".to_string(),
        ));
    }
    fields.insert("canonical_key".to_string(), Value::String(key));

    if collection.requires_rating() {
        let rating = fields
            .get("rating")
            .and_then(Value::as_f64)
            .filter(|r| r.is_finite())
            .ok_or_else(|| {
                AppError::Validation("rating (number) required for ratings".to_string())
            })?;
        if !(0.0..=5.0).contains(&rating) {
            return Err(AppError::Validation(
                "rating must be between 0 and 5".to_string(),
            ));
        }
    } else if fields.contains_key("rating") {
        return Err(AppError::Validation(format!(
            "rating not allowed for {}",
            collection
        )));
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::Validation(format!("Invalid list item: {}", e)))
}

/// Applies one insert to an in-memory snapshot of the lists
///
/// Conflicts leave `lists` untouched. On `Added` the target collection has
/// grown by one and must be persisted by the caller.
pub fn apply_insert(
    lists: &mut Collections,
    collection: Collection,
    mut item: ListItem,
    now: DateTime<Utc>,
) -> AppResult<InsertOutcome> {
    match lists.membership(&item.canonical_key) {
        Some(existing) if existing == collection => return Ok(InsertOutcome::Duplicate),
        Some(existing) => return Err(AppError::Conflict(existing)),
        None => {}
    }

    if collection.requires_rating() {
        item.rated_at.get_or_insert(now);
    } else {
        item.added_at.get_or_insert(now);
    }
    lists.get_mut(collection).push(item);
    Ok(InsertOutcome::Added)
}

/// Slice requested by a list read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Lenient parsing of query values
    ///
    /// Only the leading integer of a value counts (`2.5` is 2, `10abc` is 10).
    /// Negative offsets clamp to 0. A missing, unparsable or zero limit means
    /// the default; anything else clamps to [1, MAX_LIMIT].
    pub fn from_query(offset: Option<&str>, limit: Option<&str>) -> Self {
        let offset = offset.and_then(leading_integer).unwrap_or(0).max(0) as usize;
        let limit = match limit.and_then(leading_integer) {
            None | Some(0) => DEFAULT_LIMIT as i64,
            Some(n) => n,
        }
        .clamp(1, MAX_LIMIT as i64) as usize;

        Self { offset, limit }
    }
}

/// Optional sign followed by digits at the start of `raw`, saturating
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for digit in digits.chars().map_while(|c| c.to_digit(10)) {
        seen = true;
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }

    seen.then_some(if negative { -value } else { value })
}

/// One page of a collection
#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub items: Vec<ListItem>,
}

impl ListPage {
    pub fn slice(items: Vec<ListItem>, page: Pagination) -> Self {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        Self {
            total,
            offset: page.offset,
            limit: page.limit,
            items,
        }
    }
}

/// Message for the list writer task
struct InsertRequest {
    collection: Collection,
    item: ListItem,
    reply: oneshot::Sender<AppResult<InsertOutcome>>,
}

/// Owner of the three collections
///
/// Reads go straight to the store. Inserts are funneled through a single
/// writer task so the membership check and the write never interleave with
/// another insert from this process.
#[derive(Clone)]
pub struct ListStore {
    store: Arc<dyn KvStore>,
    write_tx: mpsc::Sender<InsertRequest>,
}

/// Handle for gracefully shutting down the list writer
pub struct ListWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ListWriterHandle {
    /// Stops the writer after it has processed every queued insert
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("List writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "List writer task ended abnormally");
        }
    }
}

impl ListStore {
    /// Creates the store and spawns its writer task
    pub fn spawn(store: Arc<dyn KvStore>) -> (Self, ListWriterHandle) {
        let (write_tx, write_rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_store = store.clone();
        let task = tokio::spawn(async move {
            list_writer_task(writer_store, write_rx, shutdown_rx).await;
        });

        (
            Self { store, write_tx },
            ListWriterHandle { shutdown_tx, task },
        )
    }

    /// Reads one collection; an absent key is an empty list
    pub async fn read(&self, collection: Collection) -> AppResult<Vec<ListItem>> {
        read_collection(self.store.as_ref(), collection).await
    }

    /// Reads the three collections concurrently
    pub async fn read_all(&self) -> AppResult<Collections> {
        read_all_collections(self.store.as_ref()).await
    }

    pub async fn membership(&self, key: &str) -> AppResult<Option<Collection>> {
        Ok(self.read_all().await?.membership(key))
    }

    /// Validates and inserts an item
    pub async fn insert(&self, collection: Collection, payload: Value) -> AppResult<InsertOutcome> {
        let item = validate_item(collection, payload)?;
        let (reply, response) = oneshot::channel();

        self.write_tx
            .send(InsertRequest {
                collection,
                item,
                reply,
            })
            .await
            .map_err(|_| AppError::Internal("List writer is not running".to_string()))?;

        response
            .await
            .map_err(|_| AppError::Internal("List writer dropped the request".to_string()))?
    }

    pub async fn list(&self, collection: Collection, page: Pagination) -> AppResult<ListPage> {
        let items = self.read(collection).await?;
        Ok(ListPage::slice(items, page))
    }
}

/// Items are read leniently: a foreign shape never fails the whole list
async fn read_collection(store: &dyn KvStore, collection: Collection) -> AppResult<Vec<ListItem>> {
    let items = match store.get_json::<Value>(StoreKey::List(collection)).await? {
        Some(Value::Array(items)) => items,
        Some(_) => {
            tracing::warn!(collection = %collection, "Stored list is not an array, reading as empty");
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    };

    let total = items.len();
    let items: Vec<ListItem> = items.into_iter().filter_map(ListItem::from_stored).collect();
    if items.len() < total {
        tracing::warn!(
            collection = %collection,
            skipped = total - items.len(),
            "Skipping stored list entries that are not objects"
        );
    }
    Ok(items)
}

async fn read_all_collections(store: &dyn KvStore) -> AppResult<Collections> {
    let (ratings, parked, rejects) = tokio::try_join!(
        read_collection(store, Collection::Ratings),
        read_collection(store, Collection::Parked),
        read_collection(store, Collection::Rejects),
    )?;
    Ok(Collections {
        ratings,
        parked,
        rejects,
    })
}

/// Background task that applies inserts one at a time
///
/// On shutdown signal, stops accepting new requests and drains the queue.
/// Dropping the handle without signalling leaves the task running until the
/// last `ListStore` clone is gone.
async fn list_writer_task(
    store: Arc<dyn KvStore>,
    mut write_rx: mpsc::Receiver<InsertRequest>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    tracing::info!("List writer task started");

    loop {
        tokio::select! {
            Some(request) = write_rx.recv() => {
                process_insert(store.as_ref(), request).await;
            }
            Some(()) = shutdown_rx.recv() => {
                write_rx.close();
                let mut drained = 0;
                while let Some(request) = write_rx.recv().await {
                    process_insert(store.as_ref(), request).await;
                    drained += 1;
                }
                tracing::info!(drained, "List writer task stopped");
                break;
            }
            else => {
                tracing::info!("List writer task stopped, no producers left");
                break;
            }
        }
    }
}

async fn process_insert(store: &dyn KvStore, request: InsertRequest) {
    let InsertRequest {
        collection,
        item,
        reply,
    } = request;
    let key = item.canonical_key.clone();

    let result = insert_and_persist(store, collection, item).await;
    match &result {
        Ok(InsertOutcome::Added) => {
            tracing::info!(collection = %collection, canonical_key = %key, "Item added")
        }
        Ok(InsertOutcome::Duplicate) => {
            tracing::debug!(collection = %collection, canonical_key = %key, "Duplicate insert ignored")
        }
        Err(AppError::Conflict(other)) => tracing::info!(
            collection = %collection,
            canonical_key = %key,
            conflict_with = %other,
            "Insert rejected by cross-list conflict"
        ),
        Err(e) => tracing::error!(collection = %collection, error = %e, "Insert failed"),
    }

    // The caller may have gone away; the write stands either way
    let _ = reply.send(result);
}

async fn insert_and_persist(
    store: &dyn KvStore,
    collection: Collection,
    item: ListItem,
) -> AppResult<InsertOutcome> {
    let mut lists = read_all_collections(store).await?;
    let outcome = apply_insert(&mut lists, collection, item, Utc::now())?;
    if outcome == InsertOutcome::Added {
        store
            .put_json(StoreKey::List(collection), lists.get(collection))
            .await?;
    }
    Ok(outcome)
}
