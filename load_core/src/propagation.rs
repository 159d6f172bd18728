//! # Cross-Discipline Propagation
//!
//! One forward pass over the dependency graph in topological order. For each
//! source load and each id in its `affects` list the impact factor for the
//! `(source category, target category)` pair is looked up; a positive
//! `source.magnitude × factor` is folded into the target exactly once and the
//! target is immediately checked against its magnitude threshold. A target
//! is warned at most once per pass, on the contribution that first takes it
//! over its limit.
//!
//! Sources are visited after everything upstream of them, so a chain such as
//! occupancy → internal gains → cooling → HVAC draw → panel demand settles in
//! a single call. Re-invoking on an unchanged registry adds nothing: every
//! contribution is guarded by the target's `affected_by` list.
//!
//! ## Example
//!
//! ```rust
//! use load_core::loads::{LoadCategory, LoadRegistry, LoadResult};
//! use load_core::propagation::{propagate, ImpactTable};
//! use load_core::thresholds::ThresholdTable;
//! use load_core::warnings::WarningDispatcher;
//!
//! let mut registry = LoadRegistry::new();
//! registry.register(
//!     LoadResult::new("INTERNAL-R1", LoadCategory::Internal, 5.0).affecting(["COOLING-R1"]),
//! ).unwrap();
//! registry.register(LoadResult::new("COOLING-R1", LoadCategory::Cooling, 0.0)).unwrap();
//!
//! let mut dispatcher = WarningDispatcher::new();
//! let report = propagate(&mut registry, &ImpactTable::default(), &ThresholdTable::empty(), &mut dispatcher);
//!
//! assert_eq!(report.applied.len(), 1);
//! assert_eq!(registry.get("COOLING-R1").unwrap().magnitude, 5.0);
//! ```

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::DependencyGraph;
use crate::loads::{LoadCategory, LoadRegistry};
use crate::thresholds::ThresholdTable;
use crate::warnings::{LoadWarning, Severity, WarningDispatcher, CYCLIC_DEPENDENCY};

// ============================================================================
// Impact Table
// ============================================================================

/// Serialized form of one impact table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactFactorEntry {
    pub source: LoadCategory,
    pub target: LoadCategory,
    pub factor: f64,
}

impl ImpactFactorEntry {
    pub fn new(source: LoadCategory, target: LoadCategory, factor: f64) -> Self {
        ImpactFactorEntry { source, target, factor }
    }
}

static REFERENCE_IMPACTS: Lazy<ImpactTable> = Lazy::new(|| {
    use LoadCategory::*;
    ImpactTable::empty()
        .with_factor(Internal, Cooling, 1.0)
        .with_factor(Lighting, Cooling, 1.0)
        .with_factor(Equipment, Cooling, 1.0)
        // chiller input at COP ~3.5
        .with_factor(Cooling, HvacElectrical, 0.29)
        // heat pump input at COP ~3.3
        .with_factor(Heating, HvacElectrical, 0.30)
        .with_factor(Lighting, Power, 1.0)
        .with_factor(Equipment, Power, 1.0)
        .with_factor(HvacElectrical, Power, 1.0)
        .with_factor(Pump, Power, 1.0)
        .with_factor(WaterSupply, Drainage, 0.9)
        // booster power per L/s at ~10 m head
        .with_factor(WaterSupply, Pump, 0.15)
        .with_factor(Live, Dead, 0.0)
});

/// Multipliers keyed by ordered `(source, target)` category pair.
///
/// Pairs not in the table have factor 0, so an `affects` link between
/// unrelated categories is kept in the graph but transfers nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactTable {
    factors: HashMap<(LoadCategory, LoadCategory), f64>,
}

impl Default for ImpactTable {
    /// The reference building-services factors
    fn default() -> Self {
        REFERENCE_IMPACTS.clone()
    }
}

impl ImpactTable {
    pub fn empty() -> Self {
        ImpactTable {
            factors: HashMap::new(),
        }
    }

    /// Add or replace a pair (builder pattern)
    pub fn with_factor(mut self, source: LoadCategory, target: LoadCategory, factor: f64) -> Self {
        self.set(source, target, factor);
        self
    }

    pub fn set(&mut self, source: LoadCategory, target: LoadCategory, factor: f64) {
        self.factors.insert((source, target), factor);
    }

    /// Factor for the pair, 0 when absent
    pub fn factor(&self, source: LoadCategory, target: LoadCategory) -> f64 {
        self.factors.get(&(source, target)).copied().unwrap_or(0.0)
    }

    /// Whether the pair has an explicit entry (including an explicit 0)
    pub fn contains(&self, source: LoadCategory, target: LoadCategory) -> bool {
        self.factors.contains_key(&(source, target))
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Apply config rows on top of the current pairs
    pub fn apply_entries(&mut self, entries: &[ImpactFactorEntry]) {
        for entry in entries {
            self.set(entry.source, entry.target, entry.factor);
        }
    }

    /// Rows sorted by (source, target) code for stable output
    pub fn entries(&self) -> Vec<ImpactFactorEntry> {
        let mut rows: Vec<ImpactFactorEntry> = self
            .factors
            .iter()
            .map(|(&(source, target), &factor)| ImpactFactorEntry::new(source, target, factor))
            .collect();
        rows.sort_by(|a, b| (a.source.code(), a.target.code()).cmp(&(b.source.code(), b.target.code())));
        rows
    }
}

// ============================================================================
// Propagation
// ============================================================================

/// One contribution folded into a target during a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: String,
    pub target: String,
    pub factor: f64,
    pub impact: f64,
}

/// What a single propagation pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    /// Visit order (every registered load exactly once)
    pub order: Vec<String>,

    /// Strongly connected groups found in the graph
    pub cycles: Vec<Vec<String>>,

    pub applied: Vec<Contribution>,

    /// Links skipped because the source had already contributed
    pub already_applied: usize,

    /// Ids of warnings emitted during the pass
    pub warnings: Vec<String>,
}

impl PropagationReport {
    /// Whether any magnitude changed
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Run one propagation pass over `registry`.
pub fn propagate(
    registry: &mut LoadRegistry,
    impacts: &ImpactTable,
    thresholds: &ThresholdTable,
    dispatcher: &mut WarningDispatcher,
) -> PropagationReport {
    let graph = DependencyGraph::build(registry);
    let ordering = graph.topological_order();
    let mut report = PropagationReport::default();
    let mut over_limit: HashSet<String> = HashSet::new();

    for cycle in &ordering.cycles {
        report.warnings.push(emit_cycle_warning(registry, cycle, dispatcher));
    }

    for source_id in &ordering.order {
        let (source_category, source_magnitude, targets) = match registry.get(source_id) {
            Some(source) => (source.category, source.magnitude, source.affects.clone()),
            None => continue,
        };

        for target_id in &targets {
            let Some(target) = registry.get_mut(target_id) else {
                continue;
            };
            let factor = impacts.factor(source_category, target.category);
            let impact = source_magnitude * factor;
            if !(impact > 0.0) {
                continue;
            }
            if !target.apply_contribution(source_id, impact) {
                report.already_applied += 1;
                continue;
            }
            debug!(
                source = %source_id,
                target = %target_id,
                factor,
                impact,
                magnitude = target.magnitude,
                "applied contribution"
            );
            report.applied.push(Contribution {
                source: source_id.clone(),
                target: target_id.clone(),
                factor,
                impact,
            });
            if over_limit.contains(target_id) {
                continue;
            }
            if let Some(warning_id) = thresholds.check_load(registry, target_id, dispatcher) {
                over_limit.insert(target_id.clone());
                report.warnings.push(warning_id);
            }
        }
    }

    report.order = ordering.order;
    report.cycles = ordering.cycles;
    report
}

fn emit_cycle_warning(registry: &mut LoadRegistry, cycle: &[String], dispatcher: &mut WarningDispatcher) -> String {
    warn!(loads = ?cycle, "cyclic dependency detected");
    let mut warning = LoadWarning::new(
        Severity::Info,
        CYCLIC_DEPENDENCY,
        format!(
            "Cyclic dependency among {}; these loads were visited in registration order",
            cycle.join(", ")
        ),
    )
    .with_action("Remove one of the affects links so the loads form a chain")
    .auto_fixable(false);
    for id in cycle {
        if let Some(load) = registry.get(id) {
            warning = warning.with_system(load.source_system.clone());
        }
    }

    let warning_id = dispatcher.emit(warning);
    for id in cycle {
        if let Some(load) = registry.get_mut(id) {
            load.attach_warning(warning_id.clone());
        }
    }
    warning_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadResult;

    fn run(registry: &mut LoadRegistry, impacts: &ImpactTable) -> (PropagationReport, WarningDispatcher) {
        let mut dispatcher = WarningDispatcher::new();
        let report = propagate(registry, impacts, &ThresholdTable::empty(), &mut dispatcher);
        (report, dispatcher)
    }

    #[test]
    fn test_default_table() {
        let table = ImpactTable::default();
        assert_eq!(table.factor(LoadCategory::Cooling, LoadCategory::HvacElectrical), 0.29);
        assert_eq!(table.factor(LoadCategory::Live, LoadCategory::Dead), 0.0);
        assert!(table.contains(LoadCategory::Live, LoadCategory::Dead));
        assert_eq!(table.factor(LoadCategory::Wind, LoadCategory::Power), 0.0);
        assert!(!table.contains(LoadCategory::Wind, LoadCategory::Power));
    }

    #[test]
    fn test_entries_override_and_add() {
        let mut table = ImpactTable::default();
        let before = table.len();
        table.apply_entries(&[
            ImpactFactorEntry::new(LoadCategory::Cooling, LoadCategory::HvacElectrical, 0.25),
            ImpactFactorEntry::new(LoadCategory::Snow, LoadCategory::Dead, 1.0),
        ]);
        assert_eq!(table.len(), before + 1);
        assert_eq!(table.factor(LoadCategory::Cooling, LoadCategory::HvacElectrical), 0.25);
        assert_eq!(table.entries().len(), table.len());
    }

    #[test]
    fn test_chain_settles_in_one_pass() {
        let mut registry = LoadRegistry::new();
        // Registered downstream-first to prove ordering, not insertion, drives the pass
        registry
            .register(LoadResult::new("ELEC-HVAC-R1", LoadCategory::HvacElectrical, 0.0))
            .unwrap();
        registry
            .register(LoadResult::new("COOLING-R1", LoadCategory::Cooling, 2.0).affecting(["ELEC-HVAC-R1"]))
            .unwrap();
        registry
            .register(LoadResult::new("INTERNAL-R1", LoadCategory::Internal, 8.0).affecting(["COOLING-R1"]))
            .unwrap();

        let (report, _) = run(&mut registry, &ImpactTable::default());

        assert_eq!(report.applied.len(), 2);
        assert_eq!(registry.get("COOLING-R1").unwrap().magnitude, 10.0);
        let hvac = registry.get("ELEC-HVAC-R1").unwrap();
        assert!((hvac.magnitude - 2.9).abs() < 1e-9);
        assert_eq!(hvac.affected_by, vec!["COOLING-R1".to_string()]);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("A", LoadCategory::Internal, 5.0).affecting(["B"]))
            .unwrap();
        registry.register(LoadResult::new("B", LoadCategory::Cooling, 0.0)).unwrap();
        let table = ImpactTable::default();

        let (first, _) = run(&mut registry, &table);
        let (second, _) = run(&mut registry, &table);

        assert!(first.changed());
        assert!(!second.changed());
        assert_eq!(second.already_applied, 1);
        assert_eq!(registry.get("B").unwrap().magnitude, 5.0);
    }

    #[test]
    fn test_zero_factor_and_dangling_skipped() {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("LIVE-F1", LoadCategory::Live, 100.0).affecting(["DEAD-F1", "GHOST"]))
            .unwrap();
        registry.register(LoadResult::new("DEAD-F1", LoadCategory::Dead, 50.0)).unwrap();

        let (report, dispatcher) = run(&mut registry, &ImpactTable::default());

        assert!(!report.changed());
        assert!(dispatcher.is_empty());
        let dead = registry.get("DEAD-F1").unwrap();
        assert_eq!(dead.magnitude, 50.0);
        assert!(dead.affected_by.is_empty());
    }

    #[test]
    fn test_cycle_emits_one_info_warning() {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("X", LoadCategory::Cooling, 1.0).affecting(["Y"]))
            .unwrap();
        registry
            .register(LoadResult::new("Y", LoadCategory::Cooling, 1.0).affecting(["X"]))
            .unwrap();
        registry.register(LoadResult::new("Z", LoadCategory::Power, 0.0)).unwrap();

        let (report, dispatcher) = run(&mut registry, &ImpactTable::default());

        assert_eq!(report.order.len(), 3);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(dispatcher.len(), 1);
        let warning = &dispatcher.log()[0];
        assert_eq!(warning.severity, Severity::Info);
        assert_eq!(warning.category, CYCLIC_DEPENDENCY);
        assert!(warning.message.contains('X') && warning.message.contains('Y'));
        assert_eq!(registry.get("X").unwrap().warnings, vec![warning.id.clone()]);
    }

    #[test]
    fn test_target_threshold_checked_on_contribution() {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("L", LoadCategory::Lighting, 30.0).affecting(["P"]))
            .unwrap();
        registry.register(LoadResult::new("P", LoadCategory::Power, 0.0)).unwrap();
        let thresholds = ThresholdTable::empty().with_limit(LoadCategory::Power, 20.0, "Split panel");
        let mut dispatcher = WarningDispatcher::new();

        let report = propagate(&mut registry, &ImpactTable::default(), &thresholds, &mut dispatcher);

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(dispatcher.log()[0].load_id.as_deref(), Some("P"));
        assert_eq!(dispatcher.log()[0].threshold_exceeded, Some(20.0));
    }

    #[test]
    fn test_target_over_limit_warned_once_per_pass() {
        let mut registry = LoadRegistry::new();
        for (id, kw) in [("L1", 30.0), ("L2", 10.0), ("L3", 5.0)] {
            registry
                .register(LoadResult::new(id, LoadCategory::Lighting, kw).affecting(["P"]))
                .unwrap();
        }
        registry.register(LoadResult::new("P", LoadCategory::Power, 0.0)).unwrap();
        let thresholds = ThresholdTable::empty().with_limit(LoadCategory::Power, 20.0, "Split panel");
        let mut dispatcher = WarningDispatcher::new();

        let report = propagate(&mut registry, &ImpactTable::default(), &thresholds, &mut dispatcher);

        assert_eq!(report.applied.len(), 3);
        assert_eq!(registry.get("P").unwrap().magnitude, 45.0);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(registry.get("P").unwrap().warnings, report.warnings);
    }
}
