use serde::{Deserialize, Serialize};

/// One row of the job catalog, already normalised by the loader.
///
/// Immutable once the snapshot is built; the matching engine only borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    /// 0-based position in the catalog snapshot. Also the stable tie-break key.
    pub id: usize,
    pub family: String,
    pub subfamily: String,
    pub title: String,
    /// Global Grade (GG). `None` when the source cell was blank or non-numeric.
    pub grade: Option<i32>,
    pub career_band: Option<String>,
    pub career_level: Option<String>,
    pub family_description: String,
    pub subfamily_description: String,
    pub profile_description: String,
    pub role_description: String,
    pub grade_differentiator: String,
    pub kpis: String,
    pub qualifications: String,
}

/// Labels and accessors for the fields that make up a profile's merged text, in output order.
const MERGED_FIELDS: &[(&str, fn(&JobProfile) -> &str)] = &[
    ("Job Title", |p| &*p.title),
    ("Family", |p| &*p.family),
    ("Subfamily", |p| &*p.subfamily),
    ("Family Description", |p| &*p.family_description),
    ("Subfamily Description", |p| &*p.subfamily_description),
    ("Profile Description", |p| &*p.profile_description),
    ("Role Description", |p| &*p.role_description),
    ("Grade Differentiator", |p| &*p.grade_differentiator),
    ("KPIs", |p| &*p.kpis),
    ("Qualifications", |p| &*p.qualifications),
];

impl JobProfile {
    /// Labelled concatenation of the descriptive fields used as the embedding input,
    /// e.g. `"Job Title: X | Family: Y | ..."`. Blank fields are omitted.
    ///
    /// Returns `None` when every descriptive field is blank: such a row has nothing to embed.
    pub fn merged_text(&self) -> Option<String> {
        let parts: Vec<String> = MERGED_FIELDS
            .iter()
            .filter_map(|(label, field)| {
                let value = field(self).trim();
                (!value.is_empty()).then(|| format!("{label}: {value}"))
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// Anything that carries a Global Grade. Lets the hierarchy filter work on
/// bare `{title, grade}` pairs as well as on ranked results.
pub trait Graded {
    fn grade(&self) -> Option<i32>;
}

impl Graded for JobProfile {
    fn grade(&self) -> Option<i32> {
        self.grade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_text_labels_in_fixed_order() {
        let profile = JobProfile {
            title: "Analyst Senior Accounting".to_string(),
            family: "Finance".to_string(),
            subfamily: "Accounting".to_string(),
            kpis: "Closing on time".to_string(),
            ..Default::default()
        };
        let expected = [
            "Job Title: Analyst Senior Accounting",
            "Family: Finance",
            "Subfamily: Accounting",
            "KPIs: Closing on time",
        ]
        .join(" | ");
        assert_eq!(profile.merged_text().unwrap(), expected);
    }

    #[test]
    fn test_merged_text_skips_blank_fields() {
        let profile = JobProfile {
            title: "  Buyer ".to_string(),
            role_description: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.merged_text().unwrap(), "Job Title: Buyer");
    }

    #[test]
    fn test_merged_text_none_when_all_blank() {
        assert!(JobProfile::default().merged_text().is_none());
    }

    #[test]
    fn test_merged_text_is_deterministic() {
        let profile = JobProfile {
            title: "Supervisor Accounting".to_string(),
            profile_description: "Leads the closing team".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.merged_text(), profile.clone().merged_text());
    }
}
