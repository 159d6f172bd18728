//! # Load Schedule
//!
//! The output of one orchestration run: every load grouped by discipline,
//! the warning log, a snapshot of the dependency graph, totals, and the
//! optimization outcome when that pass ran.
//!
//! Totals are reported two ways:
//!
//! - **Per category**: every load summed by `(category, unit)`, so loads
//!   registered in a non-native unit get their own row instead of being
//!   mixed in.
//! - **Per discipline**: native-unit loads of the discipline's primary
//!   categories. Aggregating categories (panel `POWER` and the composite
//!   discipline categories) are left out because their magnitudes already
//!   contain other loads.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SCHEMA_VERSION;
use crate::graph::GraphSnapshot;
use crate::loads::{Discipline, LoadCategory, LoadRegistry, LoadResult};
use crate::optimization::OptimizationOutcome;
use crate::warnings::{LoadWarning, Severity};

/// Sum of one category in one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: LoadCategory,
    pub discipline: Discipline,
    pub unit: String,
    pub total: f64,
    pub count: usize,
}

/// Sum of one discipline's primary loads in its native unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineTotal {
    pub discipline: Discipline,
    pub unit: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub categories: Vec<CategoryTotal>,
    pub disciplines: Vec<DisciplineTotal>,
    pub load_count: usize,
    pub warning_count: usize,
    pub highest_severity: Option<Severity>,
}

impl LoadSummary {
    pub fn from_registry(registry: &LoadRegistry, warnings: &[LoadWarning]) -> Self {
        let mut categories: IndexMap<(LoadCategory, String), (f64, usize)> = IndexMap::new();
        for load in registry.iter() {
            let entry = categories
                .entry((load.category, load.unit.clone()))
                .or_insert((0.0, 0));
            entry.0 += load.magnitude;
            entry.1 += 1;
        }
        let mut categories: Vec<CategoryTotal> = categories
            .into_iter()
            .map(|((category, unit), (total, count))| CategoryTotal {
                category,
                discipline: category.discipline(),
                unit,
                total,
                count,
            })
            .collect();
        categories.sort_by_key(|c| c.category);

        let disciplines = Discipline::ALL
            .iter()
            .map(|&discipline| {
                let unit = discipline.native_unit();
                let primary: Vec<&LoadResult> = registry.list_by(|load| {
                    load.category.discipline() == discipline && !load.category.is_aggregate() && load.unit == unit
                });
                DisciplineTotal {
                    discipline,
                    unit: unit.to_string(),
                    total: primary.iter().map(|load| load.magnitude).sum(),
                    count: primary.len(),
                }
            })
            .collect();

        LoadSummary {
            categories,
            disciplines,
            load_count: registry.len(),
            warning_count: warnings.len(),
            highest_severity: warnings.iter().map(|w| w.severity).min(),
        }
    }

    pub fn category_total(&self, category: LoadCategory) -> f64 {
        self.categories
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.total)
            .sum()
    }

    pub fn discipline_total(&self, discipline: Discipline) -> Option<&DisciplineTotal> {
        self.disciplines.iter().find(|d| d.discipline == discipline)
    }
}

/// Output of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSchedule {
    /// Schema version for compatibility checking
    pub version: String,

    pub building_id: String,

    /// Unique per run
    pub run_id: Uuid,

    pub generated_at: DateTime<Utc>,

    /// Loads by discipline, each list in registration order
    pub loads: IndexMap<Discipline, Vec<LoadResult>>,

    /// Warning log in emission order
    pub warnings: Vec<LoadWarning>,

    pub dependency_graph: GraphSnapshot,

    pub summary: LoadSummary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationOutcome>,
}

impl LoadSchedule {
    /// Build a schedule from the final registry state
    pub fn assemble(
        building_id: impl Into<String>,
        registry: &LoadRegistry,
        warnings: &[LoadWarning],
        dependency_graph: GraphSnapshot,
        optimization: Option<OptimizationOutcome>,
    ) -> Self {
        let mut loads: IndexMap<Discipline, Vec<LoadResult>> =
            Discipline::ALL.iter().map(|d| (*d, Vec::new())).collect();
        for load in registry.iter() {
            loads
                .entry(load.category.discipline())
                .or_default()
                .push(load.clone());
        }

        LoadSchedule {
            version: SCHEMA_VERSION.to_string(),
            building_id: building_id.into(),
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            loads,
            warnings: warnings.to_vec(),
            dependency_graph,
            summary: LoadSummary::from_registry(registry, warnings),
            optimization,
        }
    }

    pub fn loads_for(&self, discipline: Discipline) -> &[LoadResult] {
        self.loads.get(&discipline).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find_load(&self, id: &str) -> Option<&LoadResult> {
        self.loads.values().flatten().find(|load| load.id == id)
    }

    pub fn load_count(&self) -> usize {
        self.loads.values().map(Vec::len).sum()
    }

    /// Warnings at or above `severity`
    pub fn warnings_at_least(&self, severity: Severity) -> Vec<&LoadWarning> {
        self.warnings
            .iter()
            .filter(|w| w.severity.is_at_least(severity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;

    fn registry() -> LoadRegistry {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("LIGHTING-R1", LoadCategory::Lighting, 2.0).affecting(["POWER-F1"]))
            .unwrap();
        registry.register(LoadResult::new("POWER-F1", LoadCategory::Power, 2.0)).unwrap();
        registry.register(LoadResult::new("DEAD-F1", LoadCategory::Dead, 100.0)).unwrap();
        registry
            .register(LoadResult::new("DEAD-X", LoadCategory::Dead, 7.0).with_unit("kip"))
            .unwrap();
        registry
            .register(LoadResult::new("PUMP-B", LoadCategory::Pump, 0.5))
            .unwrap();
        registry
    }

    #[test]
    fn test_groups_by_discipline() {
        let registry = registry();
        let graph = DependencyGraph::build(&registry).snapshot();
        let schedule = LoadSchedule::assemble("B1", &registry, &[], graph, None);

        assert_eq!(schedule.load_count(), 5);
        assert_eq!(schedule.loads_for(Discipline::Electrical).len(), 2);
        assert_eq!(schedule.loads_for(Discipline::Structural).len(), 2);
        assert_eq!(schedule.loads_for(Discipline::Thermal).len(), 0);
        assert!(schedule.find_load("PUMP-B").is_some());
        assert_eq!(schedule.dependency_graph["LIGHTING-R1"].len(), 1);
    }

    #[test]
    fn test_totals_skip_aggregates_and_foreign_units() {
        let summary = LoadSummary::from_registry(&registry(), &[]);

        // POWER is an aggregate, so only lighting counts
        let electrical = summary.discipline_total(Discipline::Electrical).unwrap();
        assert_eq!(electrical.total, 2.0);
        assert_eq!(electrical.unit, "kW");

        let structural = summary.discipline_total(Discipline::Structural).unwrap();
        assert_eq!(structural.total, 100.0);

        // Pump is plumbing but in kW, so it has no place in the L/s total
        let plumbing = summary.discipline_total(Discipline::Plumbing).unwrap();
        assert_eq!(plumbing.count, 0);

        assert_eq!(summary.category_total(LoadCategory::Power), 2.0);
        let dead_rows: Vec<_> = summary
            .categories
            .iter()
            .filter(|c| c.category == LoadCategory::Dead)
            .collect();
        assert_eq!(dead_rows.len(), 2);
    }

    #[test]
    fn test_highest_severity() {
        let warnings = vec![
            LoadWarning::new(Severity::Low, "A", "a"),
            LoadWarning::new(Severity::High, "B", "b"),
        ];
        let summary = LoadSummary::from_registry(&LoadRegistry::new(), &warnings);
        assert_eq!(summary.highest_severity, Some(Severity::High));
        assert_eq!(summary.warning_count, 2);
    }
}
