//! # Load Engine
//!
//! One session of the orchestrator. A `LoadEngine` owns the registry, the
//! warning dispatcher, the resolved tables, the calculators, the compliance
//! predicates and the capacity lookup. Nothing is global: two engines never
//! share state, and `&mut self` on every mutating operation keeps runs
//! against one engine serialized.
//!
//! ## Run Phases
//!
//! 1. Validate the building (a configuration error here is the only fatal
//!    outcome of a run)
//! 2. Clear the registry and warning log; observers stay subscribed
//! 3. Calculators, in phase order: environmental, structural, thermal,
//!    electrical, plumbing
//! 4. Propagation (one pass)
//! 5. Optimization, when enabled
//! 6. Threshold check over every load, then compliance predicates
//! 7. Assemble the [`LoadSchedule`]
//!
//! ## Example
//!
//! ```rust
//! use load_core::building::{BuildingSpecification, Floor, Space, SpaceType};
//! use load_core::config::EngineConfig;
//! use load_core::engine::LoadEngine;
//!
//! let building = BuildingSpecification::new("B1", "Annex")
//!     .with_floor(Floor::new(1).with_space(Space::new("R101", 120.0, 12, SpaceType::Office)));
//!
//! let mut engine = LoadEngine::new(EngineConfig::default()).unwrap();
//! let schedule = engine.run(&building).unwrap();
//!
//! let cooling = schedule.find_load("COOLING-R101").unwrap();
//! assert!(cooling.affected_by.contains(&"INTERNAL-R101".to_string()));
//! ```

use tracing::{info, warn};

use crate::building::BuildingSpecification;
use crate::calculators::{reference_calculators, DisciplineCalculator};
use crate::compliance::{run_predicates, CompliancePredicate};
use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::graph::{impact_chain, DependencyGraph, ImpactChain};
use crate::loads::{LoadRegistry, LoadResult};
use crate::optimization::{optimize, CapacityLookup, OptimizationOutcome};
use crate::propagation::{propagate, ImpactTable, PropagationReport};
use crate::schedule::LoadSchedule;
use crate::thresholds::ThresholdTable;
use crate::warnings::{LoadWarning, Severity, SubscriptionId, WarningCallback, WarningDispatcher};

/// Warning category for calculator output the registry refused
pub const INVALID_LOAD: &str = "INVALID_LOAD";

pub struct LoadEngine {
    config: EngineConfig,
    registry: LoadRegistry,
    dispatcher: WarningDispatcher,
    impacts: ImpactTable,
    thresholds: ThresholdTable,
    calculators: Vec<Box<dyn DisciplineCalculator>>,
    predicates: Vec<Box<dyn CompliancePredicate>>,
    capacities: Box<dyn CapacityLookup>,
}

impl std::fmt::Debug for LoadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadEngine")
            .field("loads", &self.registry.len())
            .field("warnings", &self.dispatcher.len())
            .field("calculators", &self.calculators.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("predicates", &self.predicates.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl LoadEngine {
    /// Create a session with the reference calculators and predicates.
    ///
    /// Fails if the config does not validate.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(LoadEngine {
            registry: LoadRegistry::new(),
            dispatcher: WarningDispatcher::new(),
            impacts: config.impact_table(),
            thresholds: config.threshold_table(),
            calculators: reference_calculators(&config.calculators),
            predicates: config.compliance.reference_predicates(),
            capacities: Box::new(config.capacities.clone()),
            config,
        })
    }

    // ========================================================================
    // Session setup (builder pattern)
    // ========================================================================

    /// Add a calculator, keeping phase order stable
    pub fn with_calculator(mut self, calculator: Box<dyn DisciplineCalculator>) -> Self {
        self.calculators.push(calculator);
        self.calculators.sort_by_key(|c| c.phase());
        self
    }

    /// Remove every calculator, reference ones included
    pub fn without_calculators(mut self) -> Self {
        self.calculators.clear();
        self
    }

    pub fn with_predicate(mut self, predicate: Box<dyn CompliancePredicate>) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Remove every compliance predicate, reference ones included
    pub fn without_predicates(mut self) -> Self {
        self.predicates.clear();
        self
    }

    pub fn with_capacity_lookup(mut self, capacities: Box<dyn CapacityLookup>) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn with_impact_table(mut self, impacts: ImpactTable) -> Self {
        self.impacts = impacts;
        self
    }

    pub fn with_threshold_table(mut self, thresholds: ThresholdTable) -> Self {
        self.thresholds = thresholds;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &LoadRegistry {
        &self.registry
    }

    pub fn impact_table(&self) -> &ImpactTable {
        &self.impacts
    }

    pub fn threshold_table(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Warning log in emission order
    pub fn warnings(&self) -> &[LoadWarning] {
        self.dispatcher.log()
    }

    pub fn calculator_names(&self) -> Vec<&str> {
        self.calculators.iter().map(|c| c.name()).collect()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Insert or overwrite a load, returning the previous record with that id
    pub fn register_load(&mut self, load: LoadResult) -> EngineResult<Option<LoadResult>> {
        self.registry.register(load)
    }

    pub fn get_load(&self, id: &str) -> Option<&LoadResult> {
        self.registry.get(id)
    }

    /// One propagation pass over the current registry
    pub fn propagate(&mut self) -> PropagationReport {
        propagate(&mut self.registry, &self.impacts, &self.thresholds, &mut self.dispatcher)
    }

    /// Threshold check over every registered load
    pub fn check_thresholds(&mut self) -> Vec<String> {
        self.thresholds.check_all(&mut self.registry, &mut self.dispatcher)
    }

    /// Evaluate every compliance predicate once
    pub fn run_compliance(&mut self, building: &BuildingSpecification) -> Vec<String> {
        run_predicates(&self.predicates, &mut self.registry, building, &mut self.dispatcher)
    }

    /// Optimization pass with the session's settings, regardless of `enabled`
    pub fn optimize(&mut self) -> EngineResult<OptimizationOutcome> {
        optimize(&mut self.registry, &self.config.optimization, self.capacities.as_ref())
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.registry)
    }

    /// Depth-first cascade from `load_id`; empty for an unknown id
    pub fn get_load_impact_chain(&self, load_id: &str) -> ImpactChain {
        impact_chain(&self.registry, load_id)
    }

    pub fn register_warning_callback(&mut self, callback: WarningCallback) -> SubscriptionId {
        self.dispatcher.subscribe(callback)
    }

    pub fn unregister_warning_callback(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Clear loads and warnings; observers stay subscribed
    pub fn reset(&mut self) {
        self.registry.clear();
        self.dispatcher.clear();
    }

    /// Full orchestration run for one building.
    ///
    /// Returns `Err` only when the building fails validation; everything
    /// after that degrades to warnings.
    pub fn run(&mut self, building: &BuildingSpecification) -> EngineResult<LoadSchedule> {
        building.validate()?;
        self.reset();
        info!(
            building = %building.id,
            floors = building.floors.len(),
            calculators = self.calculators.len(),
            "starting load run"
        );

        for calculator in &self.calculators {
            let produced = calculator.calculate(building, &self.registry);
            let count = produced.len();
            for load in produced {
                let load_id = load.id.clone();
                if let Err(e) = self.registry.register(load) {
                    warn!(calculator = calculator.name(), load = %load_id, error = %e, "rejected calculator output");
                    self.dispatcher.emit(
                        LoadWarning::new(
                            Severity::Medium,
                            INVALID_LOAD,
                            format!("{} produced an invalid load {}: {}", calculator.name(), load_id, e),
                        )
                        .with_action("Fix the calculator inputs; the load was not registered"),
                    );
                }
            }
            info!(phase = %calculator.phase(), calculator = calculator.name(), loads = count, "phase complete");
        }

        let report = self.propagate();
        info!(
            contributions = report.applied.len(),
            cycles = report.cycles.len(),
            "propagation complete"
        );

        let optimization = if self.config.optimization.enabled {
            // settings were validated in `new`
            Some(self.optimize()?)
        } else {
            None
        };

        let threshold_warnings = self.check_thresholds();
        let compliance_warnings = self.run_compliance(building);
        info!(
            thresholds = threshold_warnings.len(),
            compliance = compliance_warnings.len(),
            "checks complete"
        );

        let schedule = LoadSchedule::assemble(
            building.id.clone(),
            &self.registry,
            self.dispatcher.log(),
            self.dependency_graph().snapshot(),
            optimization,
        );
        info!(
            run_id = %schedule.run_id,
            loads = schedule.load_count(),
            warnings = schedule.warnings.len(),
            "load run complete"
        );
        Ok(schedule)
    }
}
