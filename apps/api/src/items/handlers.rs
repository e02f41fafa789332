//! Axum route handlers for the Items API. Every route sits behind `require_session`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::guard::CurrentSession;
use crate::errors::AppError;
use crate::extraction::DiscoveredLink;
use crate::items::display::ItemView;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub url: String,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub links: Vec<DiscoveredLink>,
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemView>,
    pub total: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/items
pub async fn handle_import(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ItemView>), AppError> {
    let item = state
        .pipeline
        .import_url(session.user_id(), &req.url)
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// POST /api/v1/items/discover
///
/// An unreachable extraction service returns an empty `links` list, not an error.
pub async fn handle_discover(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Json(req): Json<DiscoverRequest>,
) -> Result<Json<DiscoverResponse>, AppError> {
    let links = state
        .pipeline
        .discover(&req.url, req.search.as_deref())
        .await?;
    Ok(Json(DiscoverResponse { links }))
}

/// POST /api/v1/items/bulk
///
/// Runs the whole batch before responding. Outcomes are read back via the list.
pub async fn handle_bulk_import(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<BulkImportRequest>,
) -> Result<StatusCode, AppError> {
    state
        .pipeline
        .import_bulk(session.user_id(), &req.urls)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/items
pub async fn handle_list_items(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ItemListResponse>, AppError> {
    let items: Vec<ItemView> = state
        .pipeline
        .list_items(session.user_id())
        .await?
        .into_iter()
        .map(ItemView::from)
        .collect();
    Ok(Json(ItemListResponse {
        total: items.len(),
        items,
    }))
}

/// GET /api/v1/items/:id
pub async fn handle_get_item(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemView>, AppError> {
    let item = state.pipeline.get_item(session.user_id(), id).await?;
    Ok(Json(item.into()))
}
