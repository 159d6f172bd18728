//! # Load Optimization
//!
//! Optional pass that searches per-load multiplicative adjustment factors
//! within `[lower_bound, upper_bound]` to reduce a weighted objective:
//!
//! ```text
//! objective = 0.3·Σ adjusted + 0.3·max adjusted
//!           + 0.2·(n − utilization_score) + 0.2·compliance_penalty
//! ```
//!
//! - `adjusted = magnitude × factor`
//! - `utilization_score` counts loads whose `adjusted / capacity` falls in
//!   [0.7, 0.9], where capacity comes from a [`CapacityLookup`] on the load's
//!   `source_system`
//! - `n` is the number of loads in the registry
//! - `compliance_penalty` adds `overload_penalty` per load above capacity
//!
//! A load without a known capacity can never score, so it adds a constant 1
//! to `n − utilization_score` and otherwise only counts in the sum and max.
//!
//! The search is seeded hill climbing with periodic random restarts on a
//! `ChaCha8Rng`, so the same registry, config and seed always yield the same
//! outcome. If the best point found beats the all-ones baseline, every
//! magnitude is scaled by its factor and every confidence decays by
//! `confidence_decay`; otherwise the registry is left untouched.

use std::collections::HashMap;

use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{EngineError, EngineResult};
use crate::loads::LoadRegistry;

const SUM_WEIGHT: f64 = 0.3;
const PEAK_WEIGHT: f64 = 0.3;
const UTILIZATION_WEIGHT: f64 = 0.2;
const PENALTY_WEIGHT: f64 = 0.2;
const TARGET_UTILIZATION: (f64, f64) = (0.7, 0.9);
const IMPROVEMENT_EPSILON: f64 = 1e-9;

// ============================================================================
// Capacity Lookup
// ============================================================================

/// Maps a `source_system` name to its capacity in the load's unit
pub trait CapacityLookup: Send + Sync {
    fn capacity(&self, source_system: &str) -> Option<f64>;
}

impl CapacityLookup for HashMap<String, f64> {
    fn capacity(&self, source_system: &str) -> Option<f64> {
        self.get(source_system).copied()
    }
}

impl CapacityLookup for IndexMap<String, f64> {
    fn capacity(&self, source_system: &str) -> Option<f64> {
        self.get(source_system).copied()
    }
}

/// Closure-backed lookup
pub struct CapacityFn<F>(pub F);

impl<F> CapacityLookup for CapacityFn<F>
where
    F: Fn(&str) -> Option<f64> + Send + Sync,
{
    fn capacity(&self, source_system: &str) -> Option<f64> {
        (self.0)(source_system)
    }
}

/// Lookup that knows no capacities
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacities;

impl CapacityLookup for NoCapacities {
    fn capacity(&self, _source_system: &str) -> Option<f64> {
        None
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Optimization pass settings.
///
/// ## JSON Example
///
/// ```json
/// { "enabled": true, "iterations": 200, "seed": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Run the pass as part of an orchestration run
    pub enabled: bool,

    /// Candidate evaluations budget
    pub iterations: usize,

    pub seed: u64,

    pub lower_bound: f64,
    pub upper_bound: f64,

    /// Largest single-factor move per step
    pub step: f64,

    /// Restart from a random point every this many iterations (0 = never)
    pub restart_interval: usize,

    /// Confidence multiplier applied when an improvement is written back
    pub confidence_decay: f64,

    /// Objective penalty per overloaded system
    pub overload_penalty: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig {
            enabled: false,
            iterations: 100,
            seed: 42,
            lower_bound: 0.8,
            upper_bound: 1.2,
            step: 0.05,
            restart_interval: 25,
            confidence_decay: 0.95,
            overload_penalty: 10.0,
        }
    }
}

impl OptimizationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Bounds must bracket 1.0 so the unadjusted registry is a valid point.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.lower_bound > 0.0 && self.lower_bound <= 1.0 && self.upper_bound >= 1.0)
            || !self.upper_bound.is_finite()
        {
            return Err(EngineError::invalid_input(
                "optimization.bounds",
                format!("[{}, {}]", self.lower_bound, self.upper_bound),
                "Bounds must satisfy 0 < lower <= 1 <= upper",
            ));
        }
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(EngineError::invalid_input(
                "optimization.step",
                self.step.to_string(),
                "Step must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_decay) {
            return Err(EngineError::invalid_input(
                "optimization.confidence_decay",
                self.confidence_decay.to_string(),
                "Decay must be in [0, 1]",
            ));
        }
        if !(self.overload_penalty >= 0.0 && self.overload_penalty.is_finite()) {
            return Err(EngineError::invalid_input(
                "optimization.overload_penalty",
                self.overload_penalty.to_string(),
                "Penalty must be non-negative",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Search
// ============================================================================

/// Result of one optimization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// Whether the registry was rewritten
    pub improved: bool,

    pub iterations: usize,
    pub baseline_objective: f64,
    pub best_objective: f64,

    /// Best factor per load id (all 1.0 when nothing improved)
    pub factors: IndexMap<String, f64>,
}

struct Problem {
    magnitudes: Vec<f64>,
    capacities: Vec<Option<f64>>,
    overload_penalty: f64,
}

impl Problem {
    fn objective(&self, factors: &[f64]) -> f64 {
        let mut sum = 0.0;
        let mut peak = 0.0_f64;
        let mut in_band = 0usize;
        let mut overloaded = 0usize;

        for ((magnitude, capacity), factor) in self.magnitudes.iter().zip(&self.capacities).zip(factors) {
            let adjusted = magnitude * factor;
            sum += adjusted;
            peak = peak.max(adjusted);

            if let Some(capacity) = (*capacity).filter(|c| *c > 0.0) {
                let utilization = adjusted / capacity;
                if (TARGET_UTILIZATION.0..=TARGET_UTILIZATION.1).contains(&utilization) {
                    in_band += 1;
                }
                if utilization > 1.0 {
                    overloaded += 1;
                }
            }
        }

        let penalty = overloaded as f64 * self.overload_penalty;
        SUM_WEIGHT * sum
            + PEAK_WEIGHT * peak
            + UTILIZATION_WEIGHT * (self.magnitudes.len() - in_band) as f64
            + PENALTY_WEIGHT * penalty
    }
}

/// Evaluate the objective for the registry at the given factors (one per
/// load, registration order).
pub fn objective(registry: &LoadRegistry, factors: &[f64], capacities: &dyn CapacityLookup, config: &OptimizationConfig) -> f64 {
    problem(registry, capacities, config).objective(factors)
}

fn problem(registry: &LoadRegistry, capacities: &dyn CapacityLookup, config: &OptimizationConfig) -> Problem {
    Problem {
        magnitudes: registry.iter().map(|load| load.magnitude).collect(),
        capacities: registry
            .iter()
            .map(|load| capacities.capacity(&load.source_system))
            .collect(),
        overload_penalty: config.overload_penalty,
    }
}

/// Search adjustment factors and write back the best improvement.
///
/// The config is validated first; an invalid config is rejected before the
/// registry is touched.
///
/// # Returns
///
/// * `Ok(OptimizationOutcome)` - Search finished (registry rewritten only if `improved`)
/// * `Err(EngineError::InvalidInput)` - Bounds, step, decay or penalty out of range
///
/// # Example
/// ```
/// use load_core::loads::{LoadCategory, LoadRegistry, LoadResult};
/// use load_core::optimization::{optimize, NoCapacities, OptimizationConfig};
///
/// let mut registry = LoadRegistry::new();
/// registry.register(LoadResult::new("A", LoadCategory::Power, 10.0)).unwrap();
///
/// let outcome = optimize(&mut registry, &OptimizationConfig::default(), &NoCapacities)?;
/// assert!(outcome.best_objective <= outcome.baseline_objective);
/// # Ok::<(), load_core::errors::EngineError>(())
/// ```
pub fn optimize(
    registry: &mut LoadRegistry,
    config: &OptimizationConfig,
    capacities: &dyn CapacityLookup,
) -> EngineResult<OptimizationOutcome> {
    config.validate()?;
    let problem = problem(registry, capacities, config);
    let n = problem.magnitudes.len();
    let baseline = vec![1.0; n];
    let baseline_objective = problem.objective(&baseline);

    let mut best = baseline.clone();
    let mut best_objective = baseline_objective;

    if n > 0 {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut current = baseline;
        let mut current_objective = baseline_objective;

        for iteration in 0..config.iterations {
            if config.restart_interval > 0 && iteration > 0 && iteration % config.restart_interval == 0 {
                current = (0..n)
                    .map(|_| rng.gen_range(config.lower_bound..=config.upper_bound))
                    .collect();
                current_objective = problem.objective(&current);
                debug!(iteration, objective = current_objective, "optimizer restart");
            }

            let i = rng.gen_range(0..n);
            let mut candidate = current.clone();
            candidate[i] = (candidate[i] + rng.gen_range(-config.step..=config.step))
                .clamp(config.lower_bound, config.upper_bound);
            let candidate_objective = problem.objective(&candidate);

            if candidate_objective < current_objective {
                current = candidate;
                current_objective = candidate_objective;
            }
            if current_objective < best_objective {
                best.clone_from(&current);
                best_objective = current_objective;
            }
        }
    }

    let improved = best_objective < baseline_objective - IMPROVEMENT_EPSILON;
    if improved {
        for (load, factor) in registry.iter_mut().zip(&best) {
            load.magnitude *= factor;
            load.confidence = (load.confidence * config.confidence_decay).clamp(0.0, 1.0);
        }
    } else {
        best = vec![1.0; n];
        best_objective = baseline_objective;
    }

    info!(
        improved,
        iterations = config.iterations,
        baseline = baseline_objective,
        best = best_objective,
        "optimization pass complete"
    );

    Ok(OptimizationOutcome {
        improved,
        iterations: config.iterations,
        baseline_objective,
        best_objective,
        factors: registry.ids().map(str::to_string).zip(best).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::{LoadCategory, LoadResult};

    fn two_loads() -> LoadRegistry {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("A", LoadCategory::Power, 10.0).from_system("PANEL-A"))
            .unwrap();
        registry
            .register(LoadResult::new("B", LoadCategory::Power, 20.0).from_system("PANEL-B"))
            .unwrap();
        registry
    }

    #[test]
    fn test_objective_terms() {
        let registry = two_loads();
        let capacities: HashMap<String, f64> = [("PANEL-A".to_string(), 12.5), ("PANEL-B".to_string(), 10.0)]
            .into_iter()
            .collect();
        let config = OptimizationConfig::default();

        // sum 30, peak 20, A at 0.8 in band, B overloaded
        let value = objective(&registry, &[1.0, 1.0], &capacities, &config);
        let expected = 0.3 * 30.0 + 0.3 * 20.0 + 0.2 * 1.0 + 0.2 * 10.0;
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unrated_loads_count_in_utilization_term() {
        let mut registry = two_loads();
        registry
            .register(LoadResult::new("C", LoadCategory::Lighting, 5.0).from_system("LIGHTS"))
            .unwrap();
        let capacities: HashMap<String, f64> = [("PANEL-A".to_string(), 12.5)].into_iter().collect();

        // n = 3, only A in band
        let value = objective(&registry, &[1.0, 1.0, 1.0], &capacities, &OptimizationConfig::default());
        let expected = 0.3 * 35.0 + 0.3 * 20.0 + 0.2 * 2.0;
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn test_without_capacities_shrinks_loads() {
        let mut registry = two_loads();
        let outcome = optimize(&mut registry, &OptimizationConfig::default(), &NoCapacities).unwrap();

        assert!(outcome.improved);
        assert!(outcome.best_objective < outcome.baseline_objective);
        for load in registry.iter() {
            let factor = outcome.factors[&load.id];
            assert!((0.8..=1.2).contains(&factor));
            assert!((load.confidence - 0.95).abs() < 1e-12);
        }
        assert!(registry.get("B").unwrap().magnitude < 20.0);
    }

    #[test]
    fn test_seeded_runs_match() {
        let config = OptimizationConfig::default().with_seed(7);
        let mut first = two_loads();
        let mut second = two_loads();

        let a = optimize(&mut first, &config, &NoCapacities).unwrap();
        let b = optimize(&mut second, &config, &NoCapacities).unwrap();

        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_improvement_leaves_registry() {
        let mut registry = LoadRegistry::new();
        registry.register(LoadResult::new("Z", LoadCategory::Power, 0.0)).unwrap();
        let before = registry.clone();

        let outcome = optimize(&mut registry, &OptimizationConfig::default(), &NoCapacities).unwrap();

        assert!(!outcome.improved);
        assert_eq!(registry, before);
        assert_eq!(outcome.factors["Z"], 1.0);
    }

    #[test]
    fn test_empty_registry() {
        let mut registry = LoadRegistry::new();
        let outcome = optimize(&mut registry, &OptimizationConfig::default(), &NoCapacities).unwrap();
        assert!(!outcome.improved);
        assert!(outcome.factors.is_empty());
    }

    #[test]
    fn test_closure_lookup() {
        let lookup = CapacityFn(|system: &str| (system == "PANEL-A").then_some(100.0));
        assert_eq!(lookup.capacity("PANEL-A"), Some(100.0));
        assert_eq!(lookup.capacity("PANEL-B"), None);
    }

    #[test]
    fn test_validate_bounds() {
        let mut config = OptimizationConfig::default();
        assert!(config.validate().is_ok());
        config.lower_bound = 1.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected_before_search() {
        let mut registry = two_loads();
        let before = registry.clone();
        let config = OptimizationConfig {
            lower_bound: 1.2,
            upper_bound: 0.8,
            ..OptimizationConfig::default()
        };

        let err = optimize(&mut registry, &config, &NoCapacities).unwrap_err();

        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(registry, before);
    }

    #[test]
    fn test_bad_step_rejected() {
        let mut registry = two_loads();
        for step in [f64::NAN, -0.05] {
            let config = OptimizationConfig {
                step,
                ..OptimizationConfig::default()
            };
            assert!(optimize(&mut registry, &config, &NoCapacities).is_err());
        }
    }
}
