use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::Collection;
use crate::services::batch::{read_batch, requested_from_query, BatchSnapshot};
use crate::services::lists::{InsertOutcome, ListPage, Pagination};
use crate::services::recommendations::Recommendation;
use crate::services::settings::{load_settings, load_settings_document, patch_settings};

use super::AppState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 32 * 1024;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiagResponse {
    pub ok: bool,
    pub store_backend: &'static str,
    pub candidate_source: &'static str,
    pub config_version: u32,
    pub counts: BTreeMap<Collection, usize>,
}

fn parse_collection(name: &str) -> AppResult<Collection> {
    name.parse::<Collection>()
        .map_err(|_| AppError::NotFound(format!("unknown collection '{}'", name)))
}

fn parse_json_body(body: &Bytes) -> AppResult<Value> {
    if body.len() > MAX_BODY_BYTES {
        return Err(AppError::Validation(format!(
            "Payload too large ({} bytes, max {})",
            body.len(),
            MAX_BODY_BYTES
        )));
    }
    serde_json::from_slice(body).map_err(|_| AppError::Validation("Invalid JSON".to_string()))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Store backend, list sizes and settings version
pub async fn diag(State(state): State<AppState>) -> AppResult<Json<DiagResponse>> {
    let (lists, settings) = tokio::try_join!(
        state.lists.read_all(),
        load_settings(state.store.as_ref())
    )?;

    let counts = Collection::ALL
        .into_iter()
        .map(|collection| (collection, lists.get(collection).len()))
        .collect();

    Ok(Json(DiagResponse {
        ok: true,
        store_backend: state.store.backend(),
        candidate_source: state.selector.source_name(),
        config_version: settings.config_version,
        counts,
    }))
}

/// Stored settings, or the defaults
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let document = load_settings_document(state.store.as_ref()).await?;
    Ok(Json(document))
}

/// Merge-patch the stored settings
pub async fn put_settings(State(state): State<AppState>, body: Bytes) -> AppResult<Json<Value>> {
    let patch = parse_json_body(&body)?;
    let settings = patch_settings(state.store.as_ref(), patch).await?;
    Ok(Json(json!({ "ok": true, "settings": settings })))
}

/// One page of a collection
pub async fn get_list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListPage>> {
    let collection = parse_collection(&collection)?;
    let page = Pagination::from_query(query.offset.as_deref(), query.limit.as_deref());
    let listed = state.lists.list(collection, page).await?;
    Ok(Json(listed))
}

/// Add an item to a collection
pub async fn add_to_list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let collection = parse_collection(&collection)?;
    let payload = parse_json_body(&body)?;

    match state.lists.insert(collection, payload).await? {
        InsertOutcome::Added => Ok((
            StatusCode::CREATED,
            Json(json!({ "ok": true, "added": true })),
        )),
        InsertOutcome::Duplicate => Ok((
            StatusCode::OK,
            Json(json!({ "ok": true, "added": false, "reason": "duplicate" })),
        )),
    }
}

/// Several lists in one round trip
pub async fn cache_pool(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<BatchSnapshot>> {
    let requested = requested_from_query(&pairs);
    let snapshot = read_batch(&state.lists, &requested).await?;
    Ok(Json(snapshot))
}

/// Next recommendation for a type and genre
pub async fn recommend(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state
        .selector
        .recommend(query.media_type.as_deref(), query.genre.as_deref())
        .await?;
    Ok(Json(recommendation))
}
