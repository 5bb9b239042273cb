//! Built-in policy tables used when no `POLICY_PATH` override is configured.

use super::{ColumnAlias, FactorOption, GradeFactor, HierarchyLevel, HierarchyPolicy, LevelScale};
use crate::catalog::loader::CatalogField;

pub(super) fn hierarchy() -> HierarchyPolicy {
    const LEVELS: &[(&str, i32)] = &[
        ("ASSISTANT", 6),
        ("ANALISTA_JUNIOR", 8),
        ("ANALISTA_PLENO", 10),
        ("ANALISTA_SENIOR", 12),
        ("SPECIALIST", 13),
        ("SUPERVISOR", 14),
        ("COORDINATOR", 16),
        ("MANAGER", 18),
        ("SENIOR_MANAGER", 20),
        ("DIRECTOR", 22),
        ("VICE_PRESIDENT", 25),
    ];

    HierarchyPolicy::new(
        LEVELS
            .iter()
            .map(|(role, min_grade)| HierarchyLevel {
                role: (*role).to_string(),
                min_grade: *min_grade,
            })
            .collect(),
    )
}

pub(super) fn level_scale() -> LevelScale {
    LevelScale::new([
        "S1", "S2", "S3", "P1", "P2", "P3", "P4", "P5", "M1", "M2", "M3", "M4", "E1", "E2",
    ])
}

fn option(label: &str, band: &str, level: &str, range: &[i32]) -> FactorOption {
    FactorOption {
        label: label.to_string(),
        career_band: band.to_string(),
        career_level: level.to_string(),
        survey_grade_range: range.to_vec(),
    }
}

fn factor(name: &str, options: Vec<FactorOption>) -> GradeFactor {
    GradeFactor {
        name: name.to_string(),
        options,
    }
}

pub(super) fn factors() -> Vec<GradeFactor> {
    vec![
        factor(
            "Functional Knowledge",
            vec![
                option("Basic procedures", "Support", "S2", &[5, 6, 7]),
                option("Broad working knowledge", "Professional", "P1", &[8, 9, 10]),
                option(
                    "Specialised in a discipline",
                    "Professional",
                    "P3",
                    &[11, 12, 13],
                ),
                option(
                    "Expert across disciplines",
                    "Professional",
                    "P5",
                    &[14, 15, 16],
                ),
                option("Recognised authority", "Management", "M3", &[18, 19, 20]),
            ],
        ),
        factor(
            "Business Expertise",
            vec![
                option("Own tasks", "Support", "S2", &[5, 6, 7]),
                option("Own team's processes", "Professional", "P2", &[9, 10, 11]),
                option("Function's priorities", "Professional", "P4", &[12, 13, 14]),
                option("Business unit strategy", "Management", "M2", &[16, 17, 18]),
                option("Enterprise strategy", "Executive", "E1", &[21, 22, 23]),
            ],
        ),
        factor(
            "Leadership",
            vec![
                option(
                    "Individual contributor",
                    "Professional",
                    "P2",
                    &[8, 9, 10, 11],
                ),
                option("Guides peers informally", "Professional", "P4", &[12, 13]),
                option("Supervises a team", "Management", "M1", &[14, 15]),
                option("Manages managers", "Management", "M3", &[18, 19, 20]),
                option("Leads a function", "Executive", "E1", &[21, 22, 23]),
            ],
        ),
        factor(
            "Problem Solving",
            vec![
                option("Routine, defined steps", "Support", "S1", &[4, 5, 6]),
                option(
                    "Analyses standard issues",
                    "Professional",
                    "P1",
                    &[8, 9, 10],
                ),
                option(
                    "Resolves complex issues",
                    "Professional",
                    "P3",
                    &[11, 12, 13, 14],
                ),
                option("Designs new approaches", "Management", "M2", &[16, 17, 18]),
            ],
        ),
        factor(
            "Nature of Impact",
            vec![
                option("Own work", "Support", "S2", &[5, 6, 7]),
                option("Team results", "Professional", "P2", &[9, 10, 11]),
                option("Functional results", "Management", "M1", &[13, 14, 15]),
                option("Organisation results", "Management", "M4", &[19, 20, 21]),
            ],
        ),
        factor(
            "Interpersonal Skills",
            vec![
                option("Exchanges information", "Support", "S1", &[4, 5, 6]),
                option("Explains and clarifies", "Professional", "P1", &[8, 9, 10]),
                option(
                    "Persuades and negotiates",
                    "Professional",
                    "P4",
                    &[12, 13, 14],
                ),
                option(
                    "Influences at senior level",
                    "Management",
                    "M3",
                    &[17, 18, 19, 20],
                ),
            ],
        ),
    ]
}

pub(super) fn column_aliases() -> Vec<ColumnAlias> {
    let table: &[(CatalogField, &[&str])] = &[
        (CatalogField::Family, &["job family", "family"]),
        (
            CatalogField::Subfamily,
            &[
                "sub job family",
                "subfamily",
                "sub family",
                "sub-family",
                "job subfamily",
            ],
        ),
        (
            CatalogField::Title,
            &["job profile", "job title", "title", "profile title"],
        ),
        (
            CatalogField::Grade,
            &["global grade", "gg", "grade", "global grade (gg)"],
        ),
        (CatalogField::CareerBand, &["career band", "band"]),
        (CatalogField::CareerLevel, &["career level", "level"]),
        (CatalogField::FamilyDescription, &["job family description"]),
        (
            CatalogField::SubfamilyDescription,
            &["sub job family description", "subfamily description"],
        ),
        (
            CatalogField::ProfileDescription,
            &["job profile description", "profile description"],
        ),
        (CatalogField::RoleDescription, &["role description"]),
        (
            CatalogField::GradeDifferentiator,
            &[
                "grade differentiator",
                "grade differentiators",
                "grade differentiatior",
            ],
        ),
        (
            CatalogField::Kpis,
            &[
                "kpis",
                "kpi",
                "kpis / metrics",
                "kpis/metrics",
                "specific parameters / kpis",
                "specific parameters kpis",
            ],
        ),
        (
            CatalogField::Qualifications,
            &["qualifications", "qualification", "minimum qualifications"],
        ),
    ];

    table
        .iter()
        .map(|(field, aliases)| ColumnAlias {
            field: *field,
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        })
        .collect()
}
