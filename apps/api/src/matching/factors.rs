//! Grade-Factor Aggregator — folds one answer per survey factor into a single
//! level classification.
//!
//! - band: most frequent `career_band`; ties go to the band seen first
//! - level: highest `career_level` on the `LevelScale`
//! - grade: mean of the flattened survey grades, rounded half-up (12.5 → 13)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{LevelScale, PolicyTables};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("no factor selections supplied")]
    NoSelections,

    #[error("factor '{factor}' is missing a value for {field}")]
    MissingValue { factor: String, field: &'static str },

    #[error("factor '{factor}' has an empty survey grade range")]
    EmptyGradeRange { factor: String },

    #[error("factor '{factor}' uses career level '{level}' not on the scale")]
    UnknownLevel { factor: String, level: String },

    #[error("unknown grade factor '{0}'")]
    UnknownFactor(String),

    #[error("factor '{factor}' has no option '{option}'")]
    UnknownOption { factor: String, option: String },

    #[error("factor '{0}' answered more than once")]
    DuplicateFactor(String),
}

/// One factor's chosen value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeFactorSelection {
    pub career_band: String,
    pub career_level: String,
    pub survey_grade_range: Vec<i32>,
}

/// Consolidated level for a set of factor selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelClassification {
    pub career_band: String,
    pub career_level: String,
    pub survey_grade: i32,
}

/// Aggregates `selections`, which must be in a reproducible order (the canonical
/// factor order) since the band tie-break depends on it.
pub fn aggregate(
    selections: &[(String, GradeFactorSelection)],
    scale: &LevelScale,
) -> Result<LevelClassification, AggregationError> {
    if selections.is_empty() {
        return Err(AggregationError::NoSelections);
    }

    let mut band_votes: Vec<(&str, usize)> = Vec::new();
    let mut top_level: Option<(usize, &str)> = None;
    let mut grade_sum: i64 = 0;
    let mut grade_count: usize = 0;

    for (factor, selection) in selections {
        let band = selection.career_band.trim();
        if band.is_empty() {
            return Err(AggregationError::MissingValue {
                factor: factor.clone(),
                field: "career_band",
            });
        }
        let level = selection.career_level.trim();
        if level.is_empty() {
            return Err(AggregationError::MissingValue {
                factor: factor.clone(),
                field: "career_level",
            });
        }
        if selection.survey_grade_range.is_empty() {
            return Err(AggregationError::EmptyGradeRange {
                factor: factor.clone(),
            });
        }

        match band_votes.iter_mut().find(|(b, _)| *b == band) {
            Some((_, count)) => *count += 1,
            None => band_votes.push((band, 1)),
        }

        let rank = scale
            .rank(level)
            .ok_or_else(|| AggregationError::UnknownLevel {
                factor: factor.clone(),
                level: level.to_string(),
            })?;
        if top_level.map_or(true, |(best, _)| rank > best) {
            top_level = Some((rank, level));
        }

        // A range is a set of plausible grades: a repeated bound such as [8, 8] counts once.
        let mut distinct: Vec<i32> = Vec::with_capacity(selection.survey_grade_range.len());
        for grade in &selection.survey_grade_range {
            if !distinct.contains(grade) {
                distinct.push(*grade);
            }
        }
        grade_sum += distinct.iter().map(|g| i64::from(*g)).sum::<i64>();
        grade_count += distinct.len();
    }

    // Strictly-greater keeps the earliest band on a tie.
    let career_band = band_votes
        .iter()
        .fold(None, |best: Option<(&str, usize)>, &(band, count)| match best {
            Some((_, top)) if count <= top => best,
            _ => Some((band, count)),
        })
        .map(|(band, _)| band.to_string())
        .ok_or(AggregationError::NoSelections)?;

    let career_level = top_level
        .map(|(_, level)| level.to_string())
        .ok_or(AggregationError::NoSelections)?;

    Ok(LevelClassification {
        career_band,
        career_level,
        survey_grade: round_half_up_mean(grade_sum, grade_count),
    })
}

/// `f64::round` rounds half away from zero, which is half-up for positive grades.
fn round_half_up_mean(sum: i64, count: usize) -> i32 {
    (sum as f64 / count as f64).round() as i32
}

/// Resolves survey answers (factor name → option label) against the factor table.
/// Output follows the canonical factor order; every factor must be answered.
pub fn resolve_selections(
    tables: &PolicyTables,
    answers: &HashMap<String, String>,
) -> Result<Vec<(String, GradeFactorSelection)>, AggregationError> {
    if answers.is_empty() {
        return Err(AggregationError::NoSelections);
    }

    let mut normalized: HashMap<String, &str> = HashMap::with_capacity(answers.len());
    for (name, label) in answers {
        let factor = tables
            .factor(name)
            .ok_or_else(|| AggregationError::UnknownFactor(name.clone()))?;
        if normalized.contains_key(&factor.name) {
            return Err(AggregationError::DuplicateFactor(factor.name.clone()));
        }
        normalized.insert(factor.name.clone(), label.as_str());
    }

    tables
        .factors
        .iter()
        .map(|factor| {
            let label = normalized
                .get(&factor.name)
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .ok_or_else(|| AggregationError::MissingValue {
                    factor: factor.name.clone(),
                    field: "option",
                })?;
            let option = factor
                .option(label)
                .ok_or_else(|| AggregationError::UnknownOption {
                    factor: factor.name.clone(),
                    option: label.to_string(),
                })?;
            Ok((
                factor.name.clone(),
                GradeFactorSelection {
                    career_band: option.career_band.clone(),
                    career_level: option.career_level.clone(),
                    survey_grade_range: option.survey_grade_range.clone(),
                },
            ))
        })
        .collect()
}
