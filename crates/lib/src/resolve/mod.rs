//! Dependency resolution.
//!
//! Turns a set of requested project names into a [`BuildPlan`]: a
//! depth-first, post-order walk of the dependency graph. Requested names and
//! each project's dependencies are visited in registration order, so the same
//! registry and request set always produce the same plan.

mod dag;
mod plan;

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, instrument};

pub use dag::PlanDag;
pub use plan::BuildPlan;

use crate::recipe::ProjectSpec;
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("no projects requested")]
  NoTargets,

  #[error("unknown project '{name}'{}", required_by.as_ref().map(|p| format!(" (required by '{p}')")).unwrap_or_default())]
  UnknownProject { name: String, required_by: Option<String> },

  #[error("dependency cycle: {}", cycle.join(" -> "))]
  CyclicDependency {
    /// The cycle, starting and ending with the same project.
    cycle: Vec<String>,
  },
}

/// Resolve the requested projects and everything they depend on.
#[instrument(skip_all, fields(requested = requested.len()))]
pub fn resolve<S: AsRef<str>>(registry: &Registry, requested: &[S]) -> Result<BuildPlan, ResolveError> {
  if requested.is_empty() {
    return Err(ResolveError::NoTargets);
  }

  let mut roots: Vec<&ProjectSpec> = Vec::with_capacity(requested.len());
  for name in requested {
    let name = name.as_ref();
    let spec = registry.get(name).ok_or_else(|| ResolveError::UnknownProject {
      name: name.to_string(),
      required_by: None,
    })?;
    roots.push(spec);
  }
  roots.sort_by_key(|spec| registry.position(&spec.name));
  roots.dedup_by(|a, b| a.name == b.name);

  let mut walker = Walker::new(registry);
  for spec in roots.iter().copied() {
    walker.visit(&spec.name, None)?;
  }

  let requested_names = roots.iter().map(|s| s.name.clone()).collect();
  let projects = walker.order.into_iter().cloned().collect();
  let plan = BuildPlan::new(projects, requested_names);
  debug!(order = ?plan.names(), "resolved build plan");
  Ok(plan)
}

/// Resolve every registered project.
pub fn resolve_all(registry: &Registry) -> Result<BuildPlan, ResolveError> {
  resolve(registry, &registry.names())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Active,
  Done,
}

struct Walker<'a> {
  registry: &'a Registry,
  marks: HashMap<&'a str, Mark>,
  stack: Vec<&'a str>,
  order: Vec<&'a ProjectSpec>,
}

impl<'a> Walker<'a> {
  fn new(registry: &'a Registry) -> Self {
    Self {
      registry,
      marks: HashMap::new(),
      stack: Vec::new(),
      order: Vec::new(),
    }
  }

  fn visit(&mut self, name: &'a str, required_by: Option<&str>) -> Result<(), ResolveError> {
    match self.marks.get(name) {
      Some(Mark::Done) => return Ok(()),
      Some(Mark::Active) => return Err(self.cycle_through(name)),
      None => {}
    }

    let registry = self.registry;
    let spec = registry.get(name).ok_or_else(|| ResolveError::UnknownProject {
      name: name.to_string(),
      required_by: required_by.map(str::to_string),
    })?;

    self.marks.insert(name, Mark::Active);
    self.stack.push(name);

    // Stable sort: unknown names keep declaration order and fail on visit.
    let mut deps: Vec<&'a str> = spec.dependencies.iter().map(String::as_str).collect();
    deps.sort_by_key(|dep| registry.position(dep).unwrap_or(usize::MAX));

    for dep in deps {
      self.visit(dep, Some(name))?;
    }

    self.stack.pop();
    self.marks.insert(name, Mark::Done);
    self.order.push(spec);
    Ok(())
  }

  fn cycle_through(&self, name: &str) -> ResolveError {
    let start = self.stack.iter().position(|n| *n == name).unwrap_or(0);
    let mut cycle: Vec<String> = self.stack[start..].iter().map(|n| n.to_string()).collect();
    cycle.push(name.to_string());
    ResolveError::CyclicDependency { cycle }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;
  use crate::recipe::Source;

  fn spec(name: &str, deps: &[&str]) -> ProjectSpec {
    ProjectSpec::new(
      name,
      "1.0",
      Source::Local {
        path: PathBuf::from("src"),
      },
    )
    .with_dependencies(deps.iter().copied())
  }

  fn registry(specs: Vec<ProjectSpec>) -> Registry {
    let mut registry = Registry::new();
    for spec in specs {
      registry.register(spec).unwrap();
    }
    registry
  }

  #[test]
  fn dependency_precedes_dependent() {
    let registry = registry(vec![spec("a", &[]), spec("b", &["a"])]);

    let plan = resolve(&registry, &["b"]).unwrap();

    assert_eq!(plan.names(), vec!["a", "b"]);
    assert_eq!(plan.requested(), ["b".to_string()]);
  }

  #[test]
  fn registration_order_breaks_ties() {
    // Registered dependencies in a different order than declared.
    let registry = registry(vec![
      spec("pixman", &[]),
      spec("zlib", &[]),
      spec("libpng", &["zlib"]),
      spec("cairo", &["libpng", "zlib", "pixman"]),
    ]);

    let plan = resolve(&registry, &["cairo"]).unwrap();

    assert_eq!(plan.names(), vec!["pixman", "zlib", "libpng", "cairo"]);
  }

  #[test]
  fn request_order_and_duplicates_do_not_matter() {
    let registry = registry(vec![spec("a", &[]), spec("b", &["a"]), spec("c", &[])]);

    let first = resolve(&registry, &["c", "b", "c"]).unwrap();
    let second = resolve(&registry, &["b", "c"]).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.names(), vec!["a", "b", "c"]);
    assert_eq!(first.requested(), ["b".to_string(), "c".to_string()]);
  }

  #[test]
  fn shared_dependency_appears_once() {
    let registry = registry(vec![
      spec("zlib", &[]),
      spec("libpng", &["zlib"]),
      spec("freetype", &["zlib"]),
      spec("cairo", &["libpng", "freetype"]),
    ]);

    let plan = resolve(&registry, &["cairo"]).unwrap();

    assert_eq!(plan.names(), vec!["zlib", "libpng", "freetype", "cairo"]);
  }

  #[test]
  fn only_needed_projects_are_planned() {
    let registry = registry(vec![spec("a", &[]), spec("b", &["a"]), spec("unrelated", &[])]);
    let plan = resolve(&registry, &["b"]).unwrap();
    assert!(plan.get("unrelated").is_none());
  }

  #[test]
  fn two_node_cycle_names_both() {
    let registry = registry(vec![spec("a", &["b"]), spec("b", &["a"])]);

    let err = resolve(&registry, &["a"]).unwrap_err();

    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()]
      }
    );
    assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
  }

  #[test]
  fn cycle_excludes_the_acyclic_prefix() {
    let registry = registry(vec![
      spec("app", &["glib"]),
      spec("glib", &["gobject"]),
      spec("gobject", &["glib"]),
    ]);

    let err = resolve(&registry, &["app"]).unwrap_err();

    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        cycle: vec!["glib".to_string(), "gobject".to_string(), "glib".to_string()]
      }
    );
  }

  #[test]
  fn unknown_requested_name() {
    let registry = registry(vec![spec("a", &[])]);

    let err = resolve(&registry, &["gtk"]).unwrap_err();

    assert_eq!(
      err,
      ResolveError::UnknownProject {
        name: "gtk".to_string(),
        required_by: None
      }
    );
    assert_eq!(err.to_string(), "unknown project 'gtk'");
  }

  #[test]
  fn unknown_dependency_names_the_dependent() {
    let registry = registry(vec![spec("pycairo", &["cairo"])]);

    let err = resolve(&registry, &["pycairo"]).unwrap_err();

    assert_eq!(err.to_string(), "unknown project 'cairo' (required by 'pycairo')");
  }

  #[test]
  fn empty_request_rejected() {
    let registry = registry(vec![spec("a", &[])]);
    let none: [&str; 0] = [];
    assert_eq!(resolve(&registry, &none).unwrap_err(), ResolveError::NoTargets);
  }

  #[test]
  fn resolve_all_plans_everything() {
    let registry = registry(vec![spec("b", &["a"]), spec("a", &[]), spec("c", &[])]);

    let plan = resolve_all(&registry).unwrap();

    assert_eq!(plan.names(), vec!["a", "b", "c"]);
    assert_eq!(plan.requested().len(), 3);
  }

  #[test]
  fn resolve_all_on_empty_registry() {
    assert_eq!(resolve_all(&Registry::new()).unwrap_err(), ResolveError::NoTargets);
  }
}
