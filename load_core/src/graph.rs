//! # Dependency Graph
//!
//! The graph is derived from the registry on demand and never stored on its
//! own: nodes are registered load ids, edges are each record's `affects`
//! entries that point at registered ids. Links to ids that are not
//! registered yet are dropped at build time and picked up by the next
//! build once the target exists.
//!
//! ## Ordering
//!
//! [`DependencyGraph::topological_order`] runs Kahn's algorithm, always
//! taking the earliest-registered ready node next. Nodes that never become
//! ready (members of a cycle and everything downstream of one) are appended
//! in registration order, and each strongly connected component that forms
//! a real cycle is reported in [`TopologicalOrder::cycles`].

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::loads::{LoadCategory, LoadRegistry};

/// Adjacency snapshot: load id → ids it affects, in registration order
pub type GraphSnapshot = IndexMap<String, IndexSet<String>>;

/// Directed graph over registered load ids.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

/// Result of ordering the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologicalOrder {
    /// Every node exactly once
    pub order: Vec<String>,

    /// Each detected cycle, members in registration order
    pub cycles: Vec<Vec<String>>,
}

impl TopologicalOrder {
    pub fn is_acyclic(&self) -> bool {
        self.cycles.is_empty()
    }
}

impl DependencyGraph {
    /// Build the graph from current registry contents.
    pub fn build(registry: &LoadRegistry) -> Self {
        let nodes: Vec<String> = registry.ids().map(str::to_string).collect();
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let edges = registry
            .iter()
            .map(|load| {
                let mut targets: Vec<usize> = Vec::with_capacity(load.affects.len());
                for target in &load.affects {
                    if let Some(&t) = index.get(target) {
                        if !targets.contains(&t) {
                            targets.push(t);
                        }
                    }
                }
                targets
            })
            .collect();

        DependencyGraph { nodes, index, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Registered targets of `id`, in declaration order
    pub fn successors(&self, id: &str) -> Vec<&str> {
        match self.index.get(id) {
            Some(&i) => self.edges[i].iter().map(|&t| self.nodes[t].as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Number of registered loads that affect `id`
    pub fn in_degree(&self, id: &str) -> usize {
        match self.index.get(id) {
            Some(&i) => self.edges.iter().filter(|targets| targets.contains(&i)).count(),
            None => 0,
        }
    }

    /// Adjacency as id → set-of-ids
    pub fn snapshot(&self) -> GraphSnapshot {
        self.nodes
            .iter()
            .zip(&self.edges)
            .map(|(id, targets)| {
                let set = targets.iter().map(|&t| self.nodes[t].clone()).collect();
                (id.clone(), set)
            })
            .collect()
    }

    /// Order every node so that sources precede their targets.
    ///
    /// # Example
    ///
    /// ```rust
    /// use load_core::graph::DependencyGraph;
    /// use load_core::loads::{LoadCategory, LoadRegistry, LoadResult};
    ///
    /// let mut registry = LoadRegistry::new();
    /// registry.register(LoadResult::new("COOLING", LoadCategory::Cooling, 0.0).affecting(["HVAC"]))?;
    /// registry.register(LoadResult::new("HVAC", LoadCategory::HvacElectrical, 0.0))?;
    /// registry.register(LoadResult::new("LIGHTS", LoadCategory::Lighting, 1.0).affecting(["COOLING"]))?;
    ///
    /// let order = DependencyGraph::build(&registry).topological_order();
    /// assert_eq!(order.order, vec!["LIGHTS", "COOLING", "HVAC"]);
    /// assert!(order.is_acyclic());
    /// # Ok::<(), load_core::errors::EngineError>(())
    /// ```
    pub fn topological_order(&self) -> TopologicalOrder {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        for targets in &self.edges {
            for &t in targets {
                in_degree[t] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(node)) = ready.pop() {
            placed[node] = true;
            order.push(node);
            for &t in &self.edges[node] {
                in_degree[t] -= 1;
                if in_degree[t] == 0 {
                    ready.push(Reverse(t));
                }
            }
        }

        let leftover: Vec<usize> = (0..n).filter(|&i| !placed[i]).collect();
        let cycles = if leftover.is_empty() {
            Vec::new()
        } else {
            self.cycles_among(&leftover)
        };
        order.extend(leftover);

        TopologicalOrder {
            order: order.into_iter().map(|i| self.nodes[i].clone()).collect(),
            cycles: cycles
                .into_iter()
                .map(|c| c.into_iter().map(|i| self.nodes[i].clone()).collect())
                .collect(),
        }
    }

    /// Strongly connected components of the subgraph induced by `subset`
    /// that contain a cycle (more than one node, or a self-loop).
    fn cycles_among(&self, subset: &[usize]) -> Vec<Vec<usize>> {
        let mut included = vec![false; self.nodes.len()];
        for &i in subset {
            included[i] = true;
        }

        let mut tarjan = Tarjan {
            graph: self,
            included: &included,
            discovered: vec![None; self.nodes.len()],
            low: vec![0; self.nodes.len()],
            on_stack: vec![false; self.nodes.len()],
            stack: Vec::new(),
            counter: 0,
            components: Vec::new(),
        };
        for &v in subset {
            if tarjan.discovered[v].is_none() {
                tarjan.connect(v);
            }
        }

        let mut cycles: Vec<Vec<usize>> = tarjan
            .components
            .into_iter()
            .filter(|c| c.len() > 1 || self.edges[c[0]].contains(&c[0]))
            .map(|mut c| {
                c.sort_unstable();
                c
            })
            .collect();
        cycles.sort_by_key(|c| c[0]);
        cycles
    }
}

struct Tarjan<'a> {
    graph: &'a DependencyGraph,
    included: &'a [bool],
    discovered: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    counter: usize,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn connect(&mut self, v: usize) {
        self.discovered[v] = Some(self.counter);
        self.low[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let graph = self.graph;
        for &w in &graph.edges[v] {
            if !self.included[w] {
                continue;
            }
            match self.discovered[w] {
                None => {
                    self.connect(w);
                    self.low[v] = self.low[v].min(self.low[w]);
                }
                Some(d) if self.on_stack[w] => {
                    self.low[v] = self.low[v].min(d);
                }
                Some(_) => {}
            }
        }

        if Some(self.low[v]) == self.discovered[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

/// One node of an impact chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactChainNode {
    pub load_id: String,
    /// Distance from the root along `affects` links
    pub depth: usize,
    pub magnitude: f64,
    pub category: LoadCategory,
    /// Categories of the registered loads this node affects
    pub affected_categories: Vec<LoadCategory>,
}

/// Depth-first cascade reachable from one root load
pub type ImpactChain = Vec<ImpactChainNode>;

/// Depth-first (preorder) traversal from `root` following `affects`.
///
/// A visited set guards the walk, so a cycle is cut where it closes instead
/// of being reported. Unregistered targets are skipped; an unregistered
/// root yields an empty chain.
pub fn impact_chain(registry: &LoadRegistry, root: &str) -> ImpactChain {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    walk(registry, root, 0, &mut visited, &mut chain);
    chain
}

fn walk(
    registry: &LoadRegistry,
    id: &str,
    depth: usize,
    visited: &mut HashSet<String>,
    chain: &mut ImpactChain,
) {
    let Some(load) = registry.get(id) else {
        return;
    };
    if !visited.insert(id.to_string()) {
        return;
    }

    let mut affected_categories = Vec::new();
    for target in &load.affects {
        if let Some(t) = registry.get(target) {
            if !affected_categories.contains(&t.category) {
                affected_categories.push(t.category);
            }
        }
    }

    chain.push(ImpactChainNode {
        load_id: load.id.clone(),
        depth,
        magnitude: load.magnitude,
        category: load.category,
        affected_categories,
    });

    for target in &load.affects {
        walk(registry, target, depth + 1, visited, chain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadResult;

    fn registry_of(edges: Vec<(&str, Vec<&str>)>) -> LoadRegistry {
        let mut registry = LoadRegistry::new();
        for (id, targets) in edges {
            registry
                .register(LoadResult::new(id, LoadCategory::Equipment, 1.0).affecting(targets))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_dangling_edges_are_omitted() {
        let registry = registry_of(vec![("A", vec!["B", "GHOST"]), ("B", vec![])]);
        let graph = DependencyGraph::build(&registry);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.successors("A"), vec!["B"]);
        assert_eq!(graph.in_degree("B"), 1);
        assert!(!graph.contains("GHOST"));
    }

    #[test]
    fn test_ties_broken_by_registration_order() {
        let registry = registry_of(vec![("C", vec![]), ("A", vec![]), ("B", vec![])]);
        let order = DependencyGraph::build(&registry).topological_order();
        assert_eq!(order.order, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_order_respects_edges_registered_backwards() {
        let registry = registry_of(vec![("HVAC", vec!["POWER"]), ("POWER", vec![]), ("COOLING", vec!["HVAC"])]);
        let order = DependencyGraph::build(&registry).topological_order();
        assert_eq!(order.order, vec!["COOLING", "HVAC", "POWER"]);
    }

    #[test]
    fn test_cycle_appended_in_registration_order() {
        let registry = registry_of(vec![
            ("ROOT", vec!["X"]),
            ("Y", vec!["X", "TAIL"]),
            ("X", vec!["Y"]),
            ("TAIL", vec![]),
        ]);
        let order = DependencyGraph::build(&registry).topological_order();
        assert_eq!(order.order, vec!["ROOT", "Y", "X", "TAIL"]);
        assert_eq!(order.cycles, vec![vec!["Y".to_string(), "X".to_string()]]);
    }

    #[test]
    fn test_each_cycle_reported_once() {
        let registry = registry_of(vec![
            ("A", vec!["B"]),
            ("B", vec!["A", "C"]),
            ("C", vec!["D"]),
            ("D", vec!["C"]),
            ("SELF", vec!["SELF"]),
        ]);
        let order = DependencyGraph::build(&registry).topological_order();
        assert_eq!(order.order.len(), 5);
        assert_eq!(order.cycles.len(), 3);
        assert_eq!(order.cycles[0], vec!["A", "B"]);
        assert_eq!(order.cycles[1], vec!["C", "D"]);
        assert_eq!(order.cycles[2], vec!["SELF"]);
    }

    #[test]
    fn test_snapshot() {
        let registry = registry_of(vec![("A", vec!["B", "C"]), ("B", vec!["C"]), ("C", vec![])]);
        let snapshot = DependencyGraph::build(&registry).snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot["A"].contains("C"));
        assert!(snapshot["C"].is_empty());
    }

    #[test]
    fn test_impact_chain_depths() {
        let registry = registry_of(vec![("A", vec!["B"]), ("B", vec!["C"]), ("C", vec![])]);
        let chain = impact_chain(&registry, "A");
        let ids: Vec<_> = chain.iter().map(|n| (n.load_id.as_str(), n.depth)).collect();
        assert_eq!(ids, vec![("A", 0), ("B", 1), ("C", 2)]);
        assert_eq!(chain[0].affected_categories, vec![LoadCategory::Equipment]);
    }

    #[test]
    fn test_impact_chain_truncates_cycles() {
        let registry = registry_of(vec![("A", vec!["B"]), ("B", vec!["A"])]);
        let chain = impact_chain(&registry, "A");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_impact_chain_unknown_root() {
        let registry = registry_of(vec![("A", vec![])]);
        assert!(impact_chain(&registry, "NOPE").is_empty());
    }
}
