//! Dependency graph over a build plan.
//!
//! Provides parallel execution waves and dependency queries for the executor.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::plan::BuildPlan;

/// A DAG of the projects in a plan, with edges from dependency to dependent.
pub struct PlanDag {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl PlanDag {
  /// Build the graph. Nodes are added in plan order, which keeps every
  /// query below deterministic.
  pub fn from_plan(plan: &BuildPlan) -> Self {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for spec in plan.projects() {
      let idx = graph.add_node(spec.name.clone());
      nodes.insert(spec.name.clone(), idx);
    }

    for spec in plan.projects() {
      let dependent = nodes[&spec.name];
      for dep in &spec.dependencies {
        // The resolver guarantees every dependency is in the plan.
        if let Some(&dependency) = nodes.get(dep) {
          graph.add_edge(dependency, dependent, ());
        }
      }
    }

    Self { graph, nodes }
  }

  pub fn is_acyclic(&self) -> bool {
    toposort(&self.graph, None).is_ok()
  }

  /// Direct dependencies of a project, in plan order.
  pub fn dependencies(&self, name: &str) -> Vec<String> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut deps: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Incoming).collect();
    deps.sort();
    deps.into_iter().map(|i| self.graph[i].clone()).collect()
  }

  /// Every project that depends on `name`, directly or transitively, in plan order.
  pub fn transitive_dependents(&self, name: &str) -> Vec<String> {
    let Some(&start) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut seen: HashSet<NodeIndex> = HashSet::new();
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
      for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
        if seen.insert(next) {
          stack.push(next);
        }
      }
    }

    let mut found: Vec<NodeIndex> = seen.into_iter().collect();
    found.sort();
    found.into_iter().map(|i| self.graph[i].clone()).collect()
  }

  /// Group projects into waves by dependency depth.
  ///
  /// Each wave contains projects whose dependencies are all in earlier waves,
  /// so a wave's members can be built in parallel.
  pub fn waves(&self) -> Vec<Vec<String>> {
    // Kahn's algorithm variant that records the level of each node.
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut node_level: HashMap<NodeIndex, usize> = HashMap::new();
    let mut remaining: Vec<NodeIndex> = self.graph.node_indices().collect();
    let mut current_level = 0;

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().copied().filter(|idx| in_degree[idx] == 0).collect();

      // Plans come from the resolver and are acyclic; bail out rather than spin.
      if ready.is_empty() {
        break;
      }

      for &idx in &ready {
        node_level.insert(idx, current_level);
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }
      remaining.retain(|idx| !ready.contains(idx));
      current_level += 1;
    }

    let mut waves: Vec<Vec<String>> = vec![Vec::new(); current_level];
    for idx in self.graph.node_indices() {
      if let Some(&level) = node_level.get(&idx) {
        waves[level].push(self.graph[idx].clone());
      }
    }

    waves
  }
}
