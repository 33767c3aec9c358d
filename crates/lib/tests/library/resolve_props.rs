//! Property tests for dependency resolution.

use std::collections::HashMap;
use std::path::PathBuf;

use forge_lib::recipe::{ProjectSpec, Source};
use forge_lib::resolve::{ResolveError, resolve, resolve_all};
use proptest::prelude::*;

use super::common::registry;

fn spec(name: &str, deps: &[String]) -> ProjectSpec {
  ProjectSpec::new(
    name,
    "1.0",
    Source::Local {
      path: PathBuf::from("src"),
    },
  )
  .with_dependencies(deps.iter().cloned())
}

/// Recipes forming a DAG: each project depends only on projects generated
/// before it. Registration order is shuffled separately.
fn dag_strategy(max: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
  (1..=max).prop_flat_map(|count| {
    let names: Vec<String> = (0..count).map(|i| format!("p{i}")).collect();
    let deps: Vec<_> = (0..count)
      .map(|i| {
        if i == 0 {
          Just(Vec::new()).boxed()
        } else {
          proptest::sample::subsequence(names[..i].to_vec(), 0..=i.min(3)).boxed()
        }
      })
      .collect();
    deps.prop_map(move |deps| names.iter().cloned().zip(deps).collect::<Vec<_>>())
  })
}

proptest! {
  #[test]
  fn dependencies_precede_dependents(
    (projects, order) in dag_strategy(12).prop_flat_map(|p| {
      let n = p.len();
      (Just(p), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    })
  ) {
    let registry = registry(order.iter().map(|&i| spec(&projects[i].0, &projects[i].1)));
    let plan = resolve_all(&registry).unwrap();

    let index: HashMap<&str, usize> = plan.names().into_iter().enumerate().map(|(i, n)| (n, i)).collect();
    prop_assert_eq!(index.len(), projects.len());
    for (name, deps) in &projects {
      for dep in deps {
        prop_assert!(index[dep.as_str()] < index[name.as_str()], "{} must precede {}", dep, name);
      }
    }
  }

  #[test]
  fn resolution_is_deterministic(
    projects in dag_strategy(10),
    picks in proptest::collection::vec(any::<prop::sample::Index>(), 1..5),
  ) {
    let registry = registry(projects.iter().map(|(n, d)| spec(n, d)));
    let requested: Vec<&str> = picks.iter().map(|i| projects[i.index(projects.len())].0.as_str()).collect();
    let mut reversed = requested.clone();
    reversed.reverse();

    let first = resolve(&registry, &requested).unwrap();
    let second = resolve(&registry, &requested).unwrap();
    let reordered = resolve(&registry, &reversed).unwrap();

    prop_assert_eq!(first.names(), second.names());
    prop_assert_eq!(first.names(), reordered.names());
  }
}

#[test]
fn two_node_cycle_names_both_projects() {
  let registry = registry([spec("a", &["b".to_string()]), spec("b", &["a".to_string()])]);

  for target in ["a", "b"] {
    match resolve(&registry, &[target]) {
      Err(ResolveError::CyclicDependency { cycle }) => {
        assert!(cycle.contains(&"a".to_string()) && cycle.contains(&"b".to_string()));
        assert_eq!(cycle.first(), cycle.last());
      }
      other => panic!("expected a cycle, got {other:?}"),
    }
  }
}
