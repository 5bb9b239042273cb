use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::embedding::EmbeddingProvider;
use crate::state::AppState;

/// GET /health
/// Returns service status, version, catalog size and the active embedding model.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let catalog = state.catalog.snapshot();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobscope-api",
        "catalog": {
            "snapshot_id": catalog.snapshot_id(),
            "profiles": catalog.len(),
            "loaded_at": catalog.loaded_at(),
        },
        "embedding_model": state.embedder.model_id(),
    }))
}
