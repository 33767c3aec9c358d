//! The resolved, immutable build plan.

use std::collections::HashMap;

use serde::Serialize;

use crate::recipe::ProjectSpec;

use super::dag::PlanDag;

/// An ordered build sequence: every project appears after all of its
/// dependencies. Created once per resolution and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
  projects: Vec<ProjectSpec>,
  requested: Vec<String>,
  #[serde(skip)]
  index: HashMap<String, usize>,
}

impl BuildPlan {
  /// Build a plan from an already topologically ordered list.
  pub(crate) fn new(projects: Vec<ProjectSpec>, requested: Vec<String>) -> Self {
    let index = projects
      .iter()
      .enumerate()
      .map(|(i, spec)| (spec.name.clone(), i))
      .collect();
    Self {
      projects,
      requested,
      index,
    }
  }

  /// Projects in build order.
  pub fn projects(&self) -> &[ProjectSpec] {
    &self.projects
  }

  /// Project names in build order.
  pub fn names(&self) -> Vec<&str> {
    self.projects.iter().map(|s| s.name.as_str()).collect()
  }

  /// Names that were explicitly requested, in registration order.
  pub fn requested(&self) -> &[String] {
    &self.requested
  }

  pub fn is_requested(&self, name: &str) -> bool {
    self.requested.iter().any(|r| r == name)
  }

  pub fn get(&self, name: &str) -> Option<&ProjectSpec> {
    self.index.get(name).map(|&i| &self.projects[i])
  }

  pub fn position(&self, name: &str) -> Option<usize> {
    self.index.get(name).copied()
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  /// Dependency graph over the plan's projects.
  pub fn dag(&self) -> PlanDag {
    PlanDag::from_plan(self)
  }

  /// Groups of project names that can build in parallel; every project's
  /// dependencies sit in an earlier wave. Names within a wave keep plan order.
  pub fn waves(&self) -> Vec<Vec<String>> {
    self.dag().waves()
  }
}
