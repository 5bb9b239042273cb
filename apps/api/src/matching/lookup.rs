//! Factor-based lookup — finds catalog profiles for an aggregated level,
//! relaxing the filter step by step until something matches.
//!
//! exact (band, level, grade) ⊆ (band, level) ⊆ (band). Only when the band
//! alone matches nothing is the lookup `NotFound`.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::matching::factors::{aggregate, resolve_selections, LevelClassification};
use crate::models::JobProfile;
use crate::policy::PolicyTables;

/// How far the filter had to be relaxed, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    BandAndLevel,
    BandOnly,
}

impl MatchTier {
    pub const CASCADE: [MatchTier; 3] = [
        MatchTier::Exact,
        MatchTier::BandAndLevel,
        MatchTier::BandOnly,
    ];

    fn admits(self, profile: &JobProfile, target: &LevelClassification) -> bool {
        let band = same_code(profile.career_band.as_deref(), &target.career_band);
        let level = || same_code(profile.career_level.as_deref(), &target.career_level);
        match self {
            MatchTier::Exact => band && level() && profile.grade == Some(target.survey_grade),
            MatchTier::BandAndLevel => band && level(),
            MatchTier::BandOnly => band,
        }
    }
}

fn same_code(value: Option<&str>, target: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(target.trim()))
}

#[derive(Debug, Clone)]
pub struct FactorMatch<'a> {
    pub tier: MatchTier,
    /// Catalog order; the first entry is the best match.
    pub profiles: Vec<&'a JobProfile>,
}

impl<'a> FactorMatch<'a> {
    pub fn best(&self) -> Option<&'a JobProfile> {
        self.profiles.first().copied()
    }
}

/// Profiles admitted at exactly one relaxation tier.
pub fn matches_at<'a>(
    tier: MatchTier,
    target: &LevelClassification,
    catalog: &'a Catalog,
) -> Vec<&'a JobProfile> {
    catalog
        .profiles()
        .iter()
        .filter(|p| tier.admits(p, target))
        .collect()
}

/// Walks the cascade and returns the first non-empty tier.
pub fn find_best_match<'a>(
    target: &LevelClassification,
    catalog: &'a Catalog,
) -> Result<FactorMatch<'a>, AppError> {
    for tier in MatchTier::CASCADE {
        let profiles = matches_at(tier, target, catalog);
        debug!("Factor lookup tier {:?}: {} matches", tier, profiles.len());
        if !profiles.is_empty() {
            return Ok(FactorMatch { tier, profiles });
        }
    }

    Err(AppError::NotFound(format!(
        "No job profile matches career band '{}' (level {}, GG {})",
        target.career_band, target.career_level, target.survey_grade
    )))
}

/// Outcome of the full factor path: the aggregated level and what it matched.
#[derive(Debug, Clone)]
pub struct FactorOutcome<'a> {
    pub classification: LevelClassification,
    pub matched: FactorMatch<'a>,
}

/// Survey answers → selections (canonical order) → aggregate → cascading lookup.
pub fn match_factors<'a>(
    answers: &HashMap<String, String>,
    tables: &PolicyTables,
    catalog: &'a Catalog,
) -> Result<FactorOutcome<'a>, AppError> {
    let selections = resolve_selections(tables, answers)?;
    let classification = aggregate(&selections, &tables.levels)?;
    let matched = find_best_match(&classification, catalog)?;
    Ok(FactorOutcome {
        classification,
        matched,
    })
}
