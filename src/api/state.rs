use std::sync::Arc;

use crate::db::KvStore;
use crate::services::{CandidateSource, ListStore, ListWriterHandle, RecommendationSelector};

/// Shared application state
///
/// Cheap to clone; every handler gets its own copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub lists: ListStore,
    pub selector: Arc<RecommendationSelector>,
}

impl AppState {
    /// Wires the services over `store` and starts the list writer
    ///
    /// Must be called from within a Tokio runtime. The returned handle drains
    /// pending inserts on shutdown.
    pub fn new(store: Arc<dyn KvStore>, source: Arc<dyn CandidateSource>) -> (Self, ListWriterHandle) {
        let (lists, writer) = ListStore::spawn(store.clone());
        let selector = Arc::new(RecommendationSelector::new(lists.clone(), store.clone(), source));

        (
            Self {
                store,
                lists,
                selector,
            },
            writer,
        )
    }
}
