pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::catalog::handlers as catalog;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog API
        .route("/api/v1/catalog/families", get(catalog::handle_families))
        .route(
            "/api/v1/catalog/profiles",
            get(catalog::handle_list_profiles),
        )
        .route(
            "/api/v1/catalog/profiles/:id",
            get(catalog::handle_get_profile),
        )
        .route("/api/v1/catalog/compare", post(catalog::handle_compare))
        .route("/api/v1/catalog/reload", post(catalog::handle_reload))
        // Matching API
        .route("/api/v1/factors", get(matching::handle_list_factors))
        .route("/api/v1/match/search", post(matching::handle_search))
        .route("/api/v1/match/factors", post(matching::handle_factor_match))
        .with_state(state)
}
