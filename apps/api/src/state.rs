use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::embedding::CachedEmbedder;
use crate::matching::search::SearchSettings;
use crate::policy::PolicyTables;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    /// Process-wide embedding provider, built once at startup. The cache inside is
    /// invalidated whenever the catalog is reloaded.
    pub embedder: Arc<CachedEmbedder>,
    /// Immutable policy tables (hierarchy levels, career-level scale, grade factors).
    pub policy: Arc<PolicyTables>,
    pub search: SearchSettings,
}
