//! Property tests over randomly wired load graphs.

use proptest::prelude::*;
use proptest::sample::Index;

use load_core::graph::DependencyGraph;
use load_core::loads::{LoadCategory, LoadRegistry, LoadResult};
use load_core::optimization::{optimize, NoCapacities, OptimizationConfig};
use load_core::propagation::{propagate, ImpactTable};
use load_core::thresholds::ThresholdTable;
use load_core::warnings::{WarningDispatcher, CYCLIC_DEPENDENCY};

const CATEGORIES: [LoadCategory; 7] = [
    LoadCategory::Internal,
    LoadCategory::Lighting,
    LoadCategory::Equipment,
    LoadCategory::Cooling,
    LoadCategory::Heating,
    LoadCategory::HvacElectrical,
    LoadCategory::Power,
];

type NodeSpec = (usize, f64, f64);

fn node_strategy() -> impl Strategy<Value = NodeSpec> {
    (0..CATEGORIES.len(), 0.0f64..500.0, 0.0f64..=1.0)
}

fn build_registry(nodes: &[NodeSpec], edges: &[(usize, usize)]) -> LoadRegistry {
    let mut registry = LoadRegistry::new();
    for (i, &(category, magnitude, confidence)) in nodes.iter().enumerate() {
        let targets: Vec<String> = edges
            .iter()
            .filter(|(from, _)| *from == i)
            .map(|(_, to)| format!("L{to}"))
            .collect();
        registry
            .register(
                LoadResult::new(format!("L{i}"), CATEGORIES[category], magnitude)
                    .affecting(targets)
                    .with_confidence(confidence),
            )
            .unwrap();
    }
    registry
}

/// Edges only run from lower to higher index, so the graph is acyclic
fn forward_edges(n: usize, picks: &[(Index, Index)]) -> Vec<(usize, usize)> {
    picks
        .iter()
        .filter_map(|(a, b)| {
            let (a, b) = (a.index(n), b.index(n));
            match a.cmp(&b) {
                std::cmp::Ordering::Less => Some((a, b)),
                std::cmp::Ordering::Greater => Some((b, a)),
                std::cmp::Ordering::Equal => None,
            }
        })
        .collect()
}

fn run_propagation(registry: &mut LoadRegistry) -> (load_core::propagation::PropagationReport, WarningDispatcher) {
    let mut dispatcher = WarningDispatcher::new();
    let report = propagate(registry, &ImpactTable::default(), &ThresholdTable::empty(), &mut dispatcher);
    (report, dispatcher)
}

proptest! {
    #[test]
    fn order_respects_every_edge(
        nodes in prop::collection::vec(node_strategy(), 1..16),
        picks in prop::collection::vec((any::<Index>(), any::<Index>()), 0..40),
    ) {
        let edges = forward_edges(nodes.len(), &picks);
        let registry = build_registry(&nodes, &edges);

        let ordering = DependencyGraph::build(&registry).topological_order();

        prop_assert!(ordering.is_acyclic());
        prop_assert_eq!(ordering.order.len(), nodes.len());
        let position = |id: &str| ordering.order.iter().position(|o| o == id).unwrap();
        for (from, to) in &edges {
            let (from_pos, to_pos) = (position(&format!("L{from}")), position(&format!("L{to}")));
            prop_assert!(from_pos < to_pos);
        }
    }

    #[test]
    fn propagation_keeps_records_valid_and_settles(
        nodes in prop::collection::vec(node_strategy(), 1..16),
        picks in prop::collection::vec((any::<Index>(), any::<Index>()), 0..40),
    ) {
        let edges = forward_edges(nodes.len(), &picks);
        let mut registry = build_registry(&nodes, &edges);

        run_propagation(&mut registry);
        for load in registry.iter() {
            prop_assert!(load.magnitude >= 0.0);
            prop_assert!((0.0..=1.0).contains(&load.confidence));
            prop_assert!(load.validate().is_ok());
        }

        let settled = registry.clone();
        let (second, _) = run_propagation(&mut registry);
        prop_assert!(!second.changed());
        prop_assert_eq!(&registry, &settled);
    }

    #[test]
    fn each_cycle_is_reported_once(
        ring_sizes in prop::collection::vec(2usize..5, 1..4),
        extra in 0usize..4,
    ) {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for size in &ring_sizes {
            let start = nodes.len();
            for k in 0..*size {
                nodes.push((k % CATEGORIES.len(), 1.0, 1.0));
                edges.push((start + k, start + (k + 1) % size));
            }
        }
        // acyclic feeders into the first ring
        for _ in 0..extra {
            edges.push((nodes.len(), 0));
            nodes.push((1, 2.0, 1.0));
        }
        let mut registry = build_registry(&nodes, &edges);

        let (report, dispatcher) = run_propagation(&mut registry);

        prop_assert_eq!(report.cycles.len(), ring_sizes.len());
        prop_assert_eq!(report.order.len(), nodes.len());
        let cycle_warnings = dispatcher
            .log()
            .iter()
            .filter(|w| w.category == CYCLIC_DEPENDENCY)
            .count();
        prop_assert_eq!(cycle_warnings, ring_sizes.len());
    }

    #[test]
    fn optimization_stays_in_bounds(
        nodes in prop::collection::vec(node_strategy(), 0..10),
        seed in any::<u64>(),
    ) {
        let mut registry = build_registry(&nodes, &[]);
        let before = registry.clone();
        let config = OptimizationConfig::default().with_seed(seed).with_iterations(60);

        let outcome = optimize(&mut registry, &config, &NoCapacities).unwrap();

        prop_assert!(outcome.best_objective <= outcome.baseline_objective);
        for (load, original) in registry.iter().zip(before.iter()) {
            prop_assert!(load.magnitude >= 0.0);
            prop_assert!((0.0..=1.0).contains(&load.confidence));
            prop_assert!(load.magnitude <= original.magnitude * config.upper_bound + 1e-9);
            prop_assert!(load.magnitude >= original.magnitude * config.lower_bound - 1e-9);
        }
    }
}
