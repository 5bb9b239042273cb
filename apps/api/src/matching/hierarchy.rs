//! Hierarchy Filter: a suggested job must sit strictly below the reporting role.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::Graded;
use crate::policy::{normalize_role, HierarchyPolicy};

/// Whether the reports-to ceiling was enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleStatus {
    /// Only candidates with `grade < min_grade` were kept.
    Applied { min_grade: i32 },
    /// The reporting role is not in the hierarchy table; candidates passed through untouched.
    NotApplied,
}

#[derive(Debug, Clone)]
pub struct ReportLineFilter<T> {
    pub candidates: Vec<T>,
    pub status: RuleStatus,
}

/// Keeps candidates whose grade is strictly below the reporting role's minimum GG.
///
/// Candidates without a numeric grade are dropped when the rule applies. An
/// unmapped role leaves the list as it was and reports `RuleStatus::NotApplied`.
/// Relative order is always preserved.
pub fn filter_by_report_line<T: Graded>(
    policy: &HierarchyPolicy,
    reporting_role: &str,
    candidates: Vec<T>,
) -> ReportLineFilter<T> {
    let Some(min_grade) = policy.min_grade_for(reporting_role) else {
        warn!(
            "Reporting role '{}' (normalised '{}') is not in the hierarchy table; rule not applied",
            reporting_role,
            normalize_role(reporting_role)
        );
        return ReportLineFilter {
            candidates,
            status: RuleStatus::NotApplied,
        };
    };

    let before = candidates.len();
    let candidates: Vec<T> = candidates
        .into_iter()
        .filter(|c| c.grade().is_some_and(|g| g < min_grade))
        .collect();

    debug!(
        "Report-line filter '{}' (GG < {}): kept {} of {}",
        reporting_role,
        min_grade,
        candidates.len(),
        before
    );

    ReportLineFilter {
        candidates,
        status: RuleStatus::Applied { min_grade },
    }
}
