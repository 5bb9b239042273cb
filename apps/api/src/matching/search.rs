//! Job Match Orchestrator — text path.
//!
//! query check → family/subfamily restriction → rank → report-line filter → limit.
//! Unlike the factor path there is no fallback: a restriction that leaves no rows
//! is `NoCandidates`, never a silent search over the whole catalog.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::matching::hierarchy::{filter_by_report_line, RuleStatus};
use crate::matching::ranker::{rank, MatchResult};
use crate::policy::HierarchyPolicy;

pub const DEFAULT_MIN_QUERY_TOKENS: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub family: Option<String>,
    pub subfamily: Option<String>,
    pub reporting_role: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub min_query_tokens: usize,
    pub default_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_tokens: DEFAULT_MIN_QUERY_TOKENS,
            default_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// What happened with the reports-to rule for this search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyReport {
    #[serde(flatten)]
    pub status: HierarchyStatus,
    pub reporting_role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HierarchyStatus {
    NotRequested,
    Applied { min_grade: i32 },
    NotApplied,
}

impl From<RuleStatus> for HierarchyStatus {
    fn from(status: RuleStatus) -> Self {
        match status {
            RuleStatus::Applied { min_grade } => HierarchyStatus::Applied { min_grade },
            RuleStatus::NotApplied => HierarchyStatus::NotApplied,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<'a> {
    pub results: Vec<MatchResult<'a>>,
    /// Rows left after the family/subfamily restriction.
    pub candidates_considered: usize,
    pub hierarchy: HierarchyReport,
}

/// Whitespace-separated token count used for the "descriptive enough" check.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Rejects queries too short to rank meaningfully. Runs before any embedding call.
pub fn check_query(query: &str, min_tokens: usize) -> Result<&str, AppError> {
    let trimmed = query.trim();
    let tokens = token_count(trimmed);
    if trimmed.is_empty() || tokens < min_tokens {
        return Err(AppError::InsufficientQuery {
            tokens,
            required: min_tokens,
        });
    }
    Ok(trimmed)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn search<'a>(
    query: &SearchQuery,
    catalog: &'a Catalog,
    provider: &dyn EmbeddingProvider,
    hierarchy: &HierarchyPolicy,
    settings: &SearchSettings,
) -> Result<SearchOutcome<'a>, AppError> {
    let text = check_query(&query.query, settings.min_query_tokens)?;

    if catalog.is_empty() {
        return Err(AppError::EmptyCatalog);
    }

    let family = non_blank(&query.family);
    let subfamily = non_blank(&query.subfamily);
    let candidates = catalog.restrict(family, subfamily);
    if candidates.is_empty() {
        return Err(AppError::NoCandidates {
            family: family.map(str::to_string),
            subfamily: subfamily.map(str::to_string),
        });
    }
    debug!(
        "Search over {} candidates (family {:?}, subfamily {:?})",
        candidates.len(),
        family,
        subfamily
    );

    let ranked = rank(text, &candidates, provider).await?;

    let reporting_role = non_blank(&query.reporting_role);
    let (mut results, status) = match reporting_role {
        Some(role) => {
            let filtered = filter_by_report_line(hierarchy, role, ranked);
            (filtered.candidates, HierarchyStatus::from(filtered.status))
        }
        None => (ranked, HierarchyStatus::NotRequested),
    };

    let limit = query.limit.unwrap_or(settings.default_limit).max(1);
    results.truncate(limit);
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }

    info!(
        "Search returned {} results from {} candidates",
        results.len(),
        candidates.len()
    );

    Ok(SearchOutcome {
        results,
        candidates_considered: candidates.len(),
        hierarchy: HierarchyReport {
            status,
            reporting_role: reporting_role.map(str::to_string),
        },
    })
}
