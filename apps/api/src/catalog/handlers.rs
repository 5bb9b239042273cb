//! Axum route handlers for browsing and comparing the catalog.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::catalog::store::{FamilySummary, ProfileComparison};
use crate::errors::AppError;
use crate::models::JobProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileFilter {
    pub family: Option<String>,
    pub subfamily: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub total: usize,
    pub profiles: Vec<JobProfile>,
}

#[derive(Debug, Serialize)]
pub struct FamiliesResponse {
    pub snapshot_id: Uuid,
    pub families: Vec<FamilySummary>,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub ids: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub snapshot_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub profile_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/catalog/families
pub async fn handle_families(State(state): State<AppState>) -> Json<FamiliesResponse> {
    let catalog = state.catalog.snapshot();
    Json(FamiliesResponse {
        snapshot_id: catalog.snapshot_id(),
        families: catalog.families(),
    })
}

/// GET /api/v1/catalog/profiles?family=&subfamily=
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(filter): Query<ProfileFilter>,
) -> Json<ProfileListResponse> {
    let catalog = state.catalog.snapshot();
    let profiles: Vec<JobProfile> = catalog
        .restrict(filter.family.as_deref(), filter.subfamily.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Json(ProfileListResponse {
        total: profiles.len(),
        profiles,
    })
}

/// GET /api/v1/catalog/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<Json<JobProfile>, AppError> {
    state
        .catalog
        .snapshot()
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job profile {id} not found")))
}

/// POST /api/v1/catalog/compare
pub async fn handle_compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<ProfileComparison>, AppError> {
    Ok(Json(state.catalog.snapshot().compare(&request.ids)?))
}

/// POST /api/v1/catalog/reload
///
/// Re-reads the catalog file and drops cached embeddings. A failed reload keeps
/// the previous snapshot serving.
pub async fn handle_reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let store = state.catalog.clone();
    let catalog = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    state.embedder.invalidate();
    info!("Catalog reload complete: {} profiles", catalog.len());

    Ok(Json(ReloadResponse {
        snapshot_id: catalog.snapshot_id(),
        loaded_at: catalog.loaded_at(),
        profile_count: catalog.len(),
    }))
}
