//! Policy tables: organisational constants loaded once at startup.
//!
//! Hierarchy levels, the career-level scale, the grade-factor survey and the catalog
//! column aliases all live here. They are built once (defaults, optionally
//! overridden by a JSON file) and handed to the components that need them, so every
//! filter and aggregator can be tested against a substitute table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::loader::{CatalogField, LoadError};

mod defaults;

// ────────────────────────────────────────────────────────────────────────────
// Hierarchy levels
// ────────────────────────────────────────────────────────────────────────────

/// A named rank in the reporting hierarchy and the minimum GG it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub role: String,
    pub min_grade: i32,
}

/// Ordered role → minimum-GG lookup. Keys are stored normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HierarchyLevel>", into = "Vec<HierarchyLevel>")]
pub struct HierarchyPolicy {
    levels: Vec<HierarchyLevel>,
}

impl HierarchyPolicy {
    pub fn new(levels: Vec<HierarchyLevel>) -> Self {
        let levels = levels
            .into_iter()
            .map(|level| HierarchyLevel {
                role: normalize_role(&level.role),
                min_grade: level.min_grade,
            })
            .collect();
        Self { levels }
    }

    /// Minimum GG for a reporting role, after normalisation. `None` if unmapped.
    pub fn min_grade_for(&self, reporting_role: &str) -> Option<i32> {
        let key = normalize_role(reporting_role);
        self.levels
            .iter()
            .find(|level| level.role == key)
            .map(|level| level.min_grade)
    }

    pub fn levels(&self) -> &[HierarchyLevel] {
        &self.levels
    }
}

impl From<Vec<HierarchyLevel>> for HierarchyPolicy {
    fn from(levels: Vec<HierarchyLevel>) -> Self {
        Self::new(levels)
    }
}

impl From<HierarchyPolicy> for Vec<HierarchyLevel> {
    fn from(policy: HierarchyPolicy) -> Self {
        policy.levels
    }
}

/// Uppercase, trim, and turn runs of spaces and slashes into single underscores:
/// `"Analista / Junior"` → `"ANALISTA_JUNIOR"`.
pub fn normalize_role(role: &str) -> String {
    role.trim()
        .to_uppercase()
        .split(|c: char| c.is_whitespace() || c == '/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ────────────────────────────────────────────────────────────────────────────
// Career-level scale
// ────────────────────────────────────────────────────────────────────────────

/// Total order over career-level codes. Position in the list is the rank;
/// raw string comparison of codes is never used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelScale {
    codes: Vec<String>,
}

impl LevelScale {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Ordinal rank of a level code (case-insensitive). `None` if not on the scale.
    pub fn rank(&self, code: &str) -> Option<usize> {
        let code = code.trim();
        self.codes.iter().position(|c| c.eq_ignore_ascii_case(code))
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grade factors
// ────────────────────────────────────────────────────────────────────────────

/// One selectable answer of a grade factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorOption {
    pub label: String,
    pub career_band: String,
    pub career_level: String,
    pub survey_grade_range: Vec<i32>,
}

/// A survey question ("factor") and its possible answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeFactor {
    pub name: String,
    pub options: Vec<FactorOption>,
}

impl GradeFactor {
    pub fn option(&self, label: &str) -> Option<&FactorOption> {
        let label = label.trim();
        self.options
            .iter()
            .find(|o| o.label.eq_ignore_ascii_case(label))
    }
}

/// Column alias entry: every header spelling that maps onto one catalog field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAlias {
    pub field: CatalogField,
    pub aliases: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregate
// ────────────────────────────────────────────────────────────────────────────

/// Every policy table the service needs. Sections missing from an override
/// file keep their built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTables {
    pub hierarchy: HierarchyPolicy,
    pub levels: LevelScale,
    /// Canonical factor order. Aggregation iterates in this order.
    pub factors: Vec<GradeFactor>,
    pub column_aliases: Vec<ColumnAlias>,
}

impl Default for PolicyTables {
    fn default() -> Self {
        Self {
            hierarchy: defaults::hierarchy(),
            levels: defaults::level_scale(),
            factors: defaults::factors(),
            column_aliases: defaults::column_aliases(),
        }
    }
}

impl PolicyTables {
    /// Built-in tables, or the JSON file at `path` layered over them.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let Some(path) = path else {
            info!("Using built-in policy tables");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tables: PolicyTables =
            serde_json::from_str(&raw).map_err(|e| LoadError::Policy(e.to_string()))?;
        tables.validate()?;

        info!(
            "Loaded policy tables from {} ({} hierarchy levels, {} factors)",
            path.display(),
            tables.hierarchy.levels().len(),
            tables.factors.len()
        );
        Ok(tables)
    }

    pub fn factor(&self, name: &str) -> Option<&GradeFactor> {
        let name = name.trim();
        self.factors
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Rejects tables the engine could not apply consistently.
    fn validate(&self) -> Result<(), LoadError> {
        for factor in &self.factors {
            for option in &factor.options {
                if self.levels.rank(&option.career_level).is_none() {
                    return Err(LoadError::Policy(format!(
                        "factor '{}' option '{}' uses level '{}' not on the career-level scale",
                        factor.name, option.label, option.career_level
                    )));
                }
                if option.survey_grade_range.is_empty() {
                    return Err(LoadError::Policy(format!(
                        "factor '{}' option '{}' has an empty survey grade range",
                        factor.name, option.label
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_role_spaces_and_slashes() {
        assert_eq!(normalize_role("Supervisor"), "SUPERVISOR");
        assert_eq!(normalize_role("  analista junior "), "ANALISTA_JUNIOR");
        assert_eq!(normalize_role("Assistant/Analyst"), "ASSISTANT_ANALYST");
        assert_eq!(normalize_role("Analista / Pleno"), "ANALISTA_PLENO");
    }

    #[test]
    fn test_default_hierarchy_supervisor_is_14() {
        let tables = PolicyTables::default();
        assert_eq!(tables.hierarchy.min_grade_for("Supervisor"), Some(14));
        assert_eq!(tables.hierarchy.min_grade_for("Unknown Role XYZ"), None);
    }

    #[test]
    fn test_hierarchy_keys_normalised_on_construction() {
        let policy = HierarchyPolicy::new(vec![HierarchyLevel {
            role: "Team Lead".to_string(),
            min_grade: 15,
        }]);
        assert_eq!(policy.min_grade_for("team lead"), Some(15));
        assert_eq!(policy.levels()[0].role, "TEAM_LEAD");
    }

    #[test]
    fn test_level_scale_rank_is_positional_not_lexical() {
        let scale = LevelScale::new(["P9", "P10", "P11"]);
        // "P10" < "P9" lexically, but ranks above it on the scale
        assert!(scale.rank("P10") > scale.rank("P9"));
        assert_eq!(scale.rank("p11"), Some(2));
        assert_eq!(scale.rank("X1"), None);
    }

    #[test]
    fn test_default_factors_reference_known_levels() {
        assert!(PolicyTables::default().validate().is_ok());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(PolicyTables::load(None).unwrap(), PolicyTables::default());
    }

    #[test]
    fn test_load_partial_override_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "hierarchy": [ {{ "role": "Chief", "min_grade": 30 }} ] }}"#
        )
        .unwrap();

        let tables = PolicyTables::load(Some(file.path())).unwrap();
        assert_eq!(tables.hierarchy.min_grade_for("chief"), Some(30));
        assert_eq!(tables.hierarchy.min_grade_for("Supervisor"), None);
        assert_eq!(tables.factors, PolicyTables::default().factors);
    }

    #[test]
    fn test_load_rejects_unknown_level_in_factor() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "levels": ["L1"], "factors": [ {{ "name": "Scope", "options": [
                {{ "label": "Team", "career_band": "Professional",
                   "career_level": "L9", "survey_grade_range": [10] }}
            ] }} ] }}"#
        )
        .unwrap();

        let err = PolicyTables::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, LoadError::Policy(_)));
    }

    #[test]
    fn test_load_malformed_json_is_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            PolicyTables::load(Some(file.path())),
            Err(LoadError::Policy(_))
        ));
    }

    #[test]
    fn test_factor_lookup_case_insensitive() {
        let tables = PolicyTables::default();
        let first = &tables.factors[0];
        let found = tables.factor(&first.name.to_lowercase()).unwrap();
        assert_eq!(found.name, first.name);
        let label = first.options[0].label.to_uppercase();
        assert!(found.option(&label).is_some());
    }
}
