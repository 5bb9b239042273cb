//! Catalog Store: the immutable in-memory snapshot and its reload boundary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::catalog::loader::{load_catalog, LoadError};
use crate::errors::AppError;
use crate::models::JobProfile;
use crate::policy::ColumnAlias;

/// Compare accepts between 2 and 6 profiles at once.
pub const MIN_COMPARE: usize = 2;
pub const MAX_COMPARE: usize = 6;

// ────────────────────────────────────────────────────────────────────────────
// Snapshot
// ────────────────────────────────────────────────────────────────────────────

/// A read-only catalog snapshot. Rows are never mutated after construction.
#[derive(Debug, Clone)]
pub struct Catalog {
    snapshot_id: Uuid,
    loaded_at: DateTime<Utc>,
    profiles: Vec<JobProfile>,
}

impl Catalog {
    /// Builds a snapshot. Row ids are reassigned to catalog position so that
    /// `id` is always usable as the stable ordering key.
    pub fn new(profiles: Vec<JobProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .enumerate()
            .map(|(id, profile)| JobProfile { id, ..profile })
            .collect();
        Self {
            snapshot_id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            profiles,
        }
    }

    pub fn snapshot_id(&self) -> Uuid {
        self.snapshot_id
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn profiles(&self) -> &[JobProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&JobProfile> {
        self.profiles.get(id)
    }

    /// Rows whose family and subfamily equal the given values. `None` means no restriction.
    pub fn restrict(&self, family: Option<&str>, subfamily: Option<&str>) -> Vec<&JobProfile> {
        let family = family.map(str::trim);
        let subfamily = subfamily.map(str::trim);
        self.profiles
            .iter()
            .filter(|p| family.map_or(true, |f| p.family == f))
            .filter(|p| subfamily.map_or(true, |s| p.subfamily == s))
            .collect()
    }

    /// Family → subfamily browse tree, in order of first appearance.
    pub fn families(&self) -> Vec<FamilySummary> {
        let mut families: Vec<FamilySummary> = Vec::new();
        let mut family_index: HashMap<&str, usize> = HashMap::new();

        for profile in &self.profiles {
            let fi = *family_index
                .entry(profile.family.as_str())
                .or_insert_with(|| {
                    families.push(FamilySummary::new(&profile.family));
                    families.len() - 1
                });
            let family = &mut families[fi];
            family.stats.record(profile.grade);

            match family
                .subfamilies
                .iter_mut()
                .find(|s| s.name == profile.subfamily)
            {
                Some(sub) => sub.stats.record(profile.grade),
                None => {
                    let mut sub = SubfamilySummary {
                        name: profile.subfamily.clone(),
                        stats: GradeStats::default(),
                    };
                    sub.stats.record(profile.grade);
                    family.subfamilies.push(sub);
                }
            }
        }
        families
    }

    /// Side-by-side view of 2..=6 distinct profiles, in the order requested.
    pub fn compare(&self, ids: &[usize]) -> Result<ProfileComparison, AppError> {
        let mut unique: Vec<usize> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if !(MIN_COMPARE..=MAX_COMPARE).contains(&unique.len()) {
            return Err(AppError::Validation(format!(
                "compare needs {MIN_COMPARE} to {MAX_COMPARE} distinct profile ids, got {}",
                unique.len()
            )));
        }

        let profiles = unique
            .iter()
            .map(|id| {
                self.get(*id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Job profile {id} not found")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = GradeStats::default();
        for p in &profiles {
            stats.record(p.grade);
        }
        let first = &profiles[0];
        let same_family = profiles.iter().all(|p| p.family == first.family);
        let same_subfamily =
            same_family && profiles.iter().all(|p| p.subfamily == first.subfamily);

        Ok(ProfileComparison {
            grade_delta: stats.min_grade.zip(stats.max_grade).map(|(lo, hi)| hi - lo),
            grade_stats: stats,
            same_family,
            same_subfamily,
            profiles,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Browse / compare views
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeStats {
    pub profile_count: usize,
    pub min_grade: Option<i32>,
    pub max_grade: Option<i32>,
}

impl GradeStats {
    fn record(&mut self, grade: Option<i32>) {
        self.profile_count += 1;
        if let Some(g) = grade {
            self.min_grade = Some(self.min_grade.map_or(g, |m| m.min(g)));
            self.max_grade = Some(self.max_grade.map_or(g, |m| m.max(g)));
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubfamilySummary {
    pub name: String,
    #[serde(flatten)]
    pub stats: GradeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilySummary {
    pub name: String,
    #[serde(flatten)]
    pub stats: GradeStats,
    pub subfamilies: Vec<SubfamilySummary>,
}

impl FamilySummary {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: GradeStats::default(),
            subfamilies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileComparison {
    pub profiles: Vec<JobProfile>,
    pub grade_stats: GradeStats,
    /// Highest minus lowest numeric grade among the compared profiles.
    pub grade_delta: Option<i32>,
    pub same_family: bool,
    pub same_subfamily: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// Holds the current snapshot. Readers clone the `Arc`; reload swaps it whole.
pub struct CatalogStore {
    source: Option<PathBuf>,
    aliases: Vec<ColumnAlias>,
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    /// Loads the catalog from `path`. A load failure here is fatal to startup.
    pub fn open(path: PathBuf, aliases: Vec<ColumnAlias>) -> Result<Self, LoadError> {
        let catalog = Catalog::new(load_catalog(&path, &aliases)?);
        info!(
            "Loaded {} job profiles from {}",
            catalog.len(),
            path.display()
        );
        Ok(Self {
            source: Some(path),
            aliases,
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    /// Store over an already-built snapshot, with no file to reload from.
    #[cfg(test)]
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            source: None,
            aliases: Vec::new(),
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().clone()
    }

    /// Re-reads the source file. On failure the previous snapshot stays current.
    pub fn reload(&self) -> Result<Arc<Catalog>, LoadError> {
        let Some(path) = &self.source else {
            return Ok(self.snapshot());
        };
        let catalog = Arc::new(Catalog::new(load_catalog(path, &self.aliases)?));
        *self.current.write() = Arc::clone(&catalog);
        info!(
            "Reloaded {} job profiles from {} (snapshot {})",
            catalog.len(),
            path.display(),
            catalog.snapshot_id()
        );
        Ok(catalog)
    }
}
