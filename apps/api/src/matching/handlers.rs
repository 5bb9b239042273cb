//! Axum route handlers for the matching API.
//!
//! Handlers call the engine and copy borrowed results into owned response bodies.
//! Nothing here ranks or filters.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::matching::factors::LevelClassification;
use crate::matching::lookup::{match_factors, MatchTier};
use crate::matching::search::{search, HierarchyReport, SearchQuery};
use crate::models::JobProfile;
use crate::policy::GradeFactor;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RankedProfile {
    pub rank: usize,
    /// Raw cosine similarity in [-1, 1].
    pub similarity_score: f32,
    pub profile: JobProfile,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<RankedProfile>,
    pub candidates_considered: usize,
    pub hierarchy: HierarchyReport,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct FactorMatchRequest {
    /// Factor name → chosen option label.
    pub selections: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct FactorMatchResponse {
    pub classification: LevelClassification,
    pub tier: MatchTier,
    pub best_match: JobProfile,
    pub matches: Vec<JobProfile>,
}

#[derive(Debug, Serialize)]
pub struct FactorsResponse {
    pub factors: Vec<GradeFactor>,
    pub career_levels: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match/search
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let catalog = state.catalog.snapshot();
    let outcome = search(
        &request,
        &catalog,
        state.embedder.as_ref(),
        &state.policy.hierarchy,
        &state.search,
    )
    .await?;

    let cache = state.embedder.stats();
    debug!(
        "Embedding cache: {} hits, {} misses, {} entries",
        cache.hits, cache.misses, cache.entries
    );

    Ok(Json(SearchResponse {
        results: outcome
            .results
            .into_iter()
            .map(|r| RankedProfile {
                rank: r.rank,
                similarity_score: r.similarity_score,
                profile: r.profile.clone(),
            })
            .collect(),
        candidates_considered: outcome.candidates_considered,
        hierarchy: outcome.hierarchy,
        model: state.embedder.model_id().to_string(),
    }))
}

/// POST /api/v1/match/factors
pub async fn handle_factor_match(
    State(state): State<AppState>,
    Json(request): Json<FactorMatchRequest>,
) -> Result<Json<FactorMatchResponse>, AppError> {
    let catalog = state.catalog.snapshot();
    let outcome = match_factors(&request.selections, &state.policy, &catalog)?;
    let best_match = outcome
        .matched
        .best()
        .cloned()
        .ok_or_else(|| AppError::NotFound("No job profile matched".to_string()))?;

    Ok(Json(FactorMatchResponse {
        classification: outcome.classification,
        tier: outcome.matched.tier,
        best_match,
        matches: outcome.matched.profiles.into_iter().cloned().collect(),
    }))
}

/// GET /api/v1/factors
pub async fn handle_list_factors(State(state): State<AppState>) -> Json<FactorsResponse> {
    Json(FactorsResponse {
        factors: state.policy.factors.clone(),
        career_levels: state.policy.levels.codes().to_vec(),
    })
}
