//! End-to-end runs over small recipe sets.

use forge_lib::config::FailurePolicy;
use forge_lib::execute::{SkipReason, execute_plan};
use forge_lib::report::{Status, Summary};
use forge_lib::resolve::{ResolveError, resolve};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::common::{config_in, local_project, registry};

#[tokio::test]
async fn dependent_builds_after_its_dependency() {
  let temp = TempDir::new().unwrap();
  let config = config_in(temp.path());
  // b checks that a already installed its artifact.
  let registry = registry([
    local_project(temp.path(), "a", &[], "mkdir -p \"$${prefix}\" && touch \"$${prefix}/a.done\""),
    local_project(temp.path(), "b", &["a"], "test -f \"$${prefix}/a.done\""),
  ]);

  let plan = resolve(&registry, &["b"]).unwrap();
  assert_eq!(plan.names(), vec!["a", "b"]);

  let result = execute_plan(&plan, config, &CancellationToken::new()).await.unwrap();
  let summary = Summary::from_result(&result);

  assert!(summary.success);
  assert_eq!((summary.built, summary.total), (2, 2));
  assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn failed_dependency_skips_dependent() {
  let temp = TempDir::new().unwrap();
  let config = config_in(temp.path());
  let registry = registry([
    local_project(temp.path(), "a", &[], "echo compiling a; exit 2"),
    local_project(temp.path(), "b", &["a"], "touch built"),
  ]);

  let plan = resolve(&registry, &["b"]).unwrap();
  let result = execute_plan(&plan, config.clone(), &CancellationToken::new()).await.unwrap();
  let summary = Summary::from_result(&result);

  assert_eq!((summary.failed, summary.skipped), (1, 1));
  assert_eq!(summary.exit_code(), 1);
  assert_eq!(
    result.get("b").unwrap().outcome.skip_reason(),
    Some(&SkipReason::DependencyFailed("a".to_string()))
  );
  assert_eq!(summary.projects[0].status, Status::Failed);
  assert!(summary.projects[0].output.as_deref().unwrap().contains("compiling a"));
  assert!(summary.projects[1].detail.as_deref().unwrap().contains("dependency failed"));
  assert_eq!(summary.first_error.unwrap().project, "a");
  assert!(!config.build_root.join("b-1.0").join("built").exists());
}

#[tokio::test]
async fn best_effort_builds_unrelated_projects() {
  let temp = TempDir::new().unwrap();
  let mut config = config_in(temp.path());
  config.policy = FailurePolicy::BestEffort;
  config.jobs = 1;
  let registry = registry([
    local_project(temp.path(), "a", &[], "exit 1"),
    local_project(temp.path(), "b", &["a"], "true"),
    local_project(temp.path(), "c", &["b"], "true"),
    local_project(temp.path(), "d", &[], "true"),
  ]);

  let plan = resolve(&registry, &["c", "d"]).unwrap();
  let result = execute_plan(&plan, config, &CancellationToken::new()).await.unwrap();

  assert!(result.get("d").unwrap().outcome.is_built());
  assert_eq!(
    result.get("c").unwrap().outcome.skip_reason(),
    Some(&SkipReason::DependencyFailed("b".to_string()))
  );
  assert_eq!((result.failed(), result.skipped(), result.built()), (1, 2, 1));
}

#[tokio::test]
async fn unknown_target_fails_before_anything_runs() {
  let temp = TempDir::new().unwrap();
  let registry = registry([local_project(temp.path(), "a", &[], "touch built")]);

  let result = resolve(&registry, &["a", "gtk"]);

  assert!(matches!(result, Err(ResolveError::UnknownProject { ref name, .. }) if name == "gtk"));
  assert!(!temp.path().join("build").exists());
}
