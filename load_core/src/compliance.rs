//! # Compliance Predicates
//!
//! Pluggable whole-registry checks run once per orchestration run, after
//! propagation (and optimization, when enabled). Each predicate inspects the
//! registry and the building and returns the warnings it wants raised; the
//! engine emits them through the dispatcher and attaches each warning id to
//! the load named by `load_id`.
//!
//! Three reference predicates ship with the engine:
//!
//! | Predicate | Demand | Capacity | Warnings |
//! |-----------|--------|----------|----------|
//! | [`StructuralCapacity`] | DEAD + LIVE per floor | floor area × allowable kPa | >1.0 CRITICAL, ≥0.9 MEDIUM |
//! | [`PanelCapacity`] | each POWER load | panel rating kW | >1.0 HIGH, ≥0.8 LOW |
//! | [`HvacCapacity`] | Σ COOLING | plant kW | >1.0 HIGH, ≥0.85 LOW |

use serde::{Deserialize, Serialize};

use crate::building::BuildingSpecification;
use crate::calculators::ids;
use crate::loads::{LoadCategory, LoadRegistry};
use crate::warnings::{LoadWarning, Severity, WarningDispatcher};

/// A whole-registry check.
pub trait CompliancePredicate: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn evaluate(&self, registry: &LoadRegistry, building: &BuildingSpecification) -> Vec<LoadWarning>;
}

/// Adapter turning a closure into a named predicate.
///
/// # Example
/// ```
/// use load_core::compliance::{predicate_fn, CompliancePredicate};
/// use load_core::warnings::{LoadWarning, Severity};
///
/// let any_loads = predicate_fn("any-loads", |registry, _building| {
///     if registry.is_empty() {
///         vec![LoadWarning::new(Severity::Low, "EMPTY", "No loads were produced")]
///     } else {
///         Vec::new()
///     }
/// });
/// assert_eq!(any_loads.name(), "any-loads");
/// ```
pub struct PredicateFn<F> {
    name: String,
    check: F,
}

pub fn predicate_fn<F>(name: impl Into<String>, check: F) -> PredicateFn<F>
where
    F: Fn(&LoadRegistry, &BuildingSpecification) -> Vec<LoadWarning> + Send + Sync,
{
    PredicateFn {
        name: name.into(),
        check,
    }
}

impl<F> CompliancePredicate for PredicateFn<F>
where
    F: Fn(&LoadRegistry, &BuildingSpecification) -> Vec<LoadWarning> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, registry: &LoadRegistry, building: &BuildingSpecification) -> Vec<LoadWarning> {
        (self.check)(registry, building)
    }
}

/// Run every predicate once and dispatch what they return.
///
/// Returns the ids of the emitted warnings in emission order.
pub fn run_predicates(
    predicates: &[Box<dyn CompliancePredicate>],
    registry: &mut LoadRegistry,
    building: &BuildingSpecification,
    dispatcher: &mut WarningDispatcher,
) -> Vec<String> {
    let mut emitted = Vec::new();
    for predicate in predicates {
        let warnings = predicate.evaluate(registry, building);
        tracing::debug!(predicate = predicate.name(), count = warnings.len(), "compliance predicate evaluated");
        for warning in warnings {
            let load_id = warning.load_id.clone();
            let warning_id = dispatcher.emit(warning);
            if let Some(load) = load_id.as_deref().and_then(|id| registry.get_mut(id)) {
                load.attach_warning(warning_id.clone());
            }
            emitted.push(warning_id);
        }
    }
    emitted
}

// ============================================================================
// Reference Predicates
// ============================================================================

/// Limits used by the reference predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceLimits {
    /// Allowable floor pressure (dead + live) in kPa
    pub floor_capacity_kpa: f64,

    /// Rating of each floor distribution panel in kW
    pub panel_rating_kw: f64,

    /// Installed cooling plant capacity in kW
    pub hvac_plant_kw: f64,
}

impl Default for ComplianceLimits {
    fn default() -> Self {
        ComplianceLimits {
            floor_capacity_kpa: 10.0,
            panel_rating_kw: 250.0,
            hvac_plant_kw: 500.0,
        }
    }
}

impl ComplianceLimits {
    /// The three reference predicates configured with these limits
    pub fn reference_predicates(&self) -> Vec<Box<dyn CompliancePredicate>> {
        vec![
            Box::new(StructuralCapacity {
                allowable_kpa: self.floor_capacity_kpa,
            }),
            Box::new(PanelCapacity {
                rating_kw: self.panel_rating_kw,
            }),
            Box::new(HvacCapacity {
                plant_kw: self.hvac_plant_kw,
            }),
        ]
    }
}

/// Gravity load per floor against slab capacity
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralCapacity {
    pub allowable_kpa: f64,
}

impl CompliancePredicate for StructuralCapacity {
    fn name(&self) -> &str {
        "structural-capacity"
    }

    fn evaluate(&self, registry: &LoadRegistry, building: &BuildingSpecification) -> Vec<LoadWarning> {
        let mut warnings = Vec::new();
        for floor in &building.floors {
            let tag = floor.tag();
            let capacity = floor.area_m2() * self.allowable_kpa;
            if capacity <= 0.0 {
                continue;
            }
            let dead_id = ids::dead(&tag);
            let demand: f64 = [dead_id.clone(), ids::live(&tag)]
                .iter()
                .filter_map(|id| registry.get(id))
                .map(|load| load.magnitude)
                .sum();
            let utilization = demand / capacity;

            let severity = if utilization > 1.0 {
                Severity::Critical
            } else if utilization >= 0.9 {
                Severity::Medium
            } else {
                continue;
            };
            let mut warning = LoadWarning::new(
                severity,
                "STRUCTURAL_CAPACITY",
                format!(
                    "Floor {tag} gravity load {demand:.1} kN is {:.0}% of slab capacity {capacity:.1} kN",
                    utilization * 100.0
                ),
            )
            .with_system(format!("STRUCTURE-{tag}"))
            .with_threshold(capacity)
            .with_action("Increase slab or framing capacity, or reduce imposed loads")
            .auto_fixable(false);
            if registry.contains(&dead_id) {
                warning = warning.for_load(dead_id);
            }
            warnings.push(warning);
        }
        warnings
    }
}

/// Each panel demand against its rating
#[derive(Debug, Clone, PartialEq)]
pub struct PanelCapacity {
    pub rating_kw: f64,
}

impl CompliancePredicate for PanelCapacity {
    fn name(&self) -> &str {
        "panel-capacity"
    }

    fn evaluate(&self, registry: &LoadRegistry, _building: &BuildingSpecification) -> Vec<LoadWarning> {
        if self.rating_kw <= 0.0 {
            return Vec::new();
        }
        registry
            .list_by(|load| load.category == LoadCategory::Power)
            .into_iter()
            .filter_map(|load| {
                let utilization = load.magnitude / self.rating_kw;
                let (severity, action) = if utilization > 1.0 {
                    (Severity::High, "Upsize the panel or move circuits to another board")
                } else if utilization >= 0.8 {
                    (Severity::Low, "Little spare capacity; reserve space for growth")
                } else {
                    return None;
                };
                Some(
                    LoadWarning::new(
                        severity,
                        "PANEL_CAPACITY",
                        format!(
                            "{} demand {:.1} kW is {:.0}% of the {:.0} kW panel rating",
                            load.id,
                            load.magnitude,
                            utilization * 100.0,
                            self.rating_kw
                        ),
                    )
                    .with_system(load.source_system.clone())
                    .with_threshold(self.rating_kw)
                    .with_action(action)
                    .auto_fixable(false)
                    .for_load(load.id.clone()),
                )
            })
            .collect()
    }
}

/// Building cooling demand against installed plant
#[derive(Debug, Clone, PartialEq)]
pub struct HvacCapacity {
    pub plant_kw: f64,
}

impl CompliancePredicate for HvacCapacity {
    fn name(&self) -> &str {
        "hvac-capacity"
    }

    fn evaluate(&self, registry: &LoadRegistry, _building: &BuildingSpecification) -> Vec<LoadWarning> {
        if self.plant_kw <= 0.0 {
            return Vec::new();
        }
        let demand: f64 = registry
            .iter()
            .filter(|load| load.category == LoadCategory::Cooling)
            .map(|load| load.magnitude)
            .sum();
        let utilization = demand / self.plant_kw;
        let severity = if utilization > 1.0 {
            Severity::High
        } else if utilization >= 0.85 {
            Severity::Low
        } else {
            return Vec::new();
        };
        vec![LoadWarning::new(
            severity,
            "HVAC_CAPACITY",
            format!(
                "Total cooling demand {demand:.1} kW is {:.0}% of the {:.0} kW plant",
                utilization * 100.0,
                self.plant_kw
            ),
        )
        .with_system("HVAC-PLANT")
        .with_threshold(self.plant_kw)
        .with_action("Add chiller capacity or reduce internal gains")
        .auto_fixable(false)]
    }
}
