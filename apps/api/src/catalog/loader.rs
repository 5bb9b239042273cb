//! Catalog Loader — reads a delimited job-architecture export into typed rows.
//!
//! The loader owns every quirk of the source files (delimiter, header spelling,
//! blank cells, "GG 12" grades). What comes out is a fixed schema; the matching
//! engine never sees an alternate column name.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::JobProfile;
use crate::policy::ColumnAlias;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog table: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("invalid policy tables: {0}")]
    Policy(String),
}

/// Canonical catalog columns. Header aliases resolve onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    Family,
    Subfamily,
    Title,
    Grade,
    CareerBand,
    CareerLevel,
    FamilyDescription,
    SubfamilyDescription,
    ProfileDescription,
    RoleDescription,
    GradeDifferentiator,
    Kpis,
    Qualifications,
}

impl CatalogField {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogField::Family => "family",
            CatalogField::Subfamily => "subfamily",
            CatalogField::Title => "title",
            CatalogField::Grade => "grade",
            CatalogField::CareerBand => "career_band",
            CatalogField::CareerLevel => "career_level",
            CatalogField::FamilyDescription => "family_description",
            CatalogField::SubfamilyDescription => "subfamily_description",
            CatalogField::ProfileDescription => "profile_description",
            CatalogField::RoleDescription => "role_description",
            CatalogField::GradeDifferentiator => "grade_differentiator",
            CatalogField::Kpis => "kpis",
            CatalogField::Qualifications => "qualifications",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Reads and normalises the catalog file at `path`.
pub fn load_catalog(path: &Path, aliases: &[ColumnAlias]) -> Result<Vec<JobProfile>, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_catalog(&raw, aliases)
}

/// Parses catalog text. Either every retained row is fully typed or the call fails.
pub fn parse_catalog(raw: &str, aliases: &[ColumnAlias]) -> Result<Vec<JobProfile>, LoadError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let delimiter = sniff_delimiter(raw);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let columns: Vec<Option<CatalogField>> = reader
        .headers()?
        .iter()
        .map(|header| resolve_header(header, aliases))
        .collect();

    for required in [CatalogField::Family, CatalogField::Title] {
        if !columns.contains(&Some(required)) {
            return Err(LoadError::MissingColumn(required.as_str()));
        }
    }

    let mut profiles = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            skipped += 1;
            continue;
        }

        let mut profile = JobProfile {
            id: profiles.len(),
            ..Default::default()
        };
        for (value, column) in record.iter().zip(&columns) {
            if let Some(field) = column {
                assign(&mut profile, *field, value);
            }
        }

        if profile.grade.is_none() {
            debug!(
                "Catalog row {} ('{}') has no numeric grade",
                profile.id, profile.title
            );
        }
        profiles.push(profile);
    }

    if skipped > 0 {
        warn!("Skipped {skipped} blank catalog rows");
    }
    debug!(
        "Parsed {} catalog rows (delimiter {:?})",
        profiles.len(),
        delimiter as char
    );
    Ok(profiles)
}

// ────────────────────────────────────────────────────────────────────────────
// Normalisation helpers
// ────────────────────────────────────────────────────────────────────────────

/// Most frequent of `;`, `,` and tab on the header line. Ties resolve to `,`.
fn sniff_delimiter(raw: &str) -> u8 {
    let header = raw.lines().next().unwrap_or_default();
    let count = |d: char| header.matches(d).count();

    [b',', b';', b'\t']
        .into_iter()
        .fold((b',', 0usize), |best, d| {
            let n = count(d as char);
            if n > best.1 {
                (d, n)
            } else {
                best
            }
        })
        .0
}

/// Lowercase, trim, and collapse internal whitespace.
fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn resolve_header(header: &str, aliases: &[ColumnAlias]) -> Option<CatalogField> {
    let normalized = normalize_header(header);
    aliases
        .iter()
        .find(|entry| {
            entry.field.as_str() == normalized
                || entry
                    .aliases
                    .iter()
                    .any(|alias| normalize_header(alias) == normalized)
        })
        .map(|entry| entry.field)
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn assign(profile: &mut JobProfile, field: CatalogField, value: &str) {
    match field {
        CatalogField::Family => profile.family = value.to_string(),
        CatalogField::Subfamily => profile.subfamily = value.to_string(),
        CatalogField::Title => profile.title = value.to_string(),
        CatalogField::Grade => profile.grade = parse_grade(value),
        CatalogField::CareerBand => profile.career_band = optional(value),
        CatalogField::CareerLevel => profile.career_level = optional(value),
        CatalogField::FamilyDescription => profile.family_description = value.to_string(),
        CatalogField::SubfamilyDescription => profile.subfamily_description = value.to_string(),
        CatalogField::ProfileDescription => profile.profile_description = value.to_string(),
        CatalogField::RoleDescription => profile.role_description = value.to_string(),
        CatalogField::GradeDifferentiator => profile.grade_differentiator = value.to_string(),
        CatalogField::Kpis => profile.kpis = value.to_string(),
        CatalogField::Qualifications => profile.qualifications = value.to_string(),
    }
}

/// Accepts `12`, `12.0`, `GG12`, `GG 12`. Anything else is treated as missing.
fn parse_grade(value: &str) -> Option<i32> {
    let value = value.trim();
    let digits = value
        .get(..2)
        .filter(|prefix| prefix.eq_ignore_ascii_case("gg"))
        .map_or(value, |_| value[2..].trim_start());

    if let Ok(grade) = digits.parse::<i32>() {
        return Some(grade);
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|g| g.is_finite() && g.fract() == 0.0 && g.abs() <= f64::from(i32::MAX))
        .map(|g| g as i32)
}
