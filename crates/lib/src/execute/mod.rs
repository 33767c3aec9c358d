//! Plan execution.
//!
//! This module provides the entry point for building a resolved plan. It handles:
//! - wave-based dependency ordering
//! - parallel execution of independent projects, bounded by `jobs`
//! - failure policy: halt after the first failure, or keep building what
//!   does not depend on it
//! - skip tracking for dependents of failed projects
//! - cancellation of projects that have not started yet

pub mod actions;
pub mod resolver;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::acquire::{AcquireError, Acquirer};
use crate::build::project_steps;
use crate::cache::DownloadCache;
use crate::config::{FailurePolicy, ForgeConfig};
use crate::env::{self, Env, ProjectVars};
use crate::recipe::ProjectSpec;
use crate::resolve::BuildPlan;

use actions::StepContext;

pub use resolver::StepResolver;
pub use types::{BuiltProject, ExecuteError, PlanResult, ProjectOutcome, ProjectResult, SkipReason};

/// Builds projects. Cheap to clone; clones share the download cache.
#[derive(Clone)]
pub struct Executor {
  config: Arc<ForgeConfig>,
  acquirer: Acquirer,
  base_env: Arc<Env>,
}

impl Executor {
  /// Create an executor. The base environment is read from the process
  /// according to `inherit_env`.
  pub fn new(config: ForgeConfig) -> Result<Self, ExecuteError> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let cache = DownloadCache::new(config.cache_dir.clone(), timeout).map_err(AcquireError::from)?;
    let acquirer = Acquirer::new(cache, config.clean, timeout);
    let base_env = env::base_env(&config);

    Ok(Self {
      config: Arc::new(config),
      acquirer,
      base_env: Arc::new(base_env),
    })
  }

  /// Replace the base environment every project starts from.
  pub fn with_base_env(mut self, base_env: Env) -> Self {
    self.base_env = Arc::new(base_env);
    self
  }

  pub fn config(&self) -> &ForgeConfig {
    &self.config
  }

  pub fn cache(&self) -> &DownloadCache {
    self.acquirer.cache()
  }

  /// Execute every project of `plan`.
  ///
  /// Project failures never abort this call; they are recorded in the
  /// returned [`PlanResult`] and the failure policy decides what else runs.
  pub async fn execute(&self, plan: &BuildPlan, cancel: &CancellationToken) -> PlanResult {
    info!(
      projects = plan.len(),
      policy = %self.config.policy,
      jobs = self.config.jobs,
      "starting plan execution"
    );

    let dag = plan.dag();
    let waves = dag.waves();
    debug!(wave_count = waves.len(), "computed execution waves");

    let semaphore = Arc::new(Semaphore::new(self.config.jobs.max(1)));
    let halted = Arc::new(AtomicBool::new(false));
    let mut outcomes: HashMap<String, ProjectOutcome> = HashMap::new();

    for (wave_idx, wave) in waves.iter().enumerate() {
      debug!(wave = wave_idx, projects = wave.len(), "executing wave");

      let mut ready = Vec::new();
      for name in wave {
        let failed_dep = dag
          .dependencies(name)
          .into_iter()
          .find(|dep| outcomes.get(dep).is_some_and(ProjectOutcome::blocks_dependents));

        let skip = if self.config.skip.contains(name) {
          Some(SkipReason::Excluded)
        } else if let Some(dep) = failed_dep {
          Some(SkipReason::DependencyFailed(dep))
        } else if cancel.is_cancelled() {
          Some(SkipReason::Cancelled)
        } else if halted.load(Ordering::SeqCst) {
          Some(SkipReason::Halted)
        } else {
          None
        };

        match skip {
          Some(SkipReason::Excluded) => {
            debug!(project = %name, "excluded, not building");
            outcomes.insert(name.clone(), ProjectOutcome::Skipped(SkipReason::Excluded));
          }
          Some(reason) => {
            warn!(project = %name, reason = %reason, "skipping project");
            outcomes.insert(name.clone(), ProjectOutcome::Skipped(reason));
          }
          None => ready.push(name.clone()),
        }
      }

      if !ready.is_empty() {
        let results = self.execute_wave(plan, &ready, &semaphore, &halted, cancel).await;
        outcomes.extend(results);
      }
    }

    let projects: Vec<ProjectResult> = plan
      .projects()
      .iter()
      .map(|spec| ProjectResult {
        name: spec.name.clone(),
        version: spec.version.clone(),
        outcome: outcomes
          .remove(&spec.name)
          .unwrap_or(ProjectOutcome::Skipped(SkipReason::Cancelled)),
      })
      .collect();

    let result = PlanResult { projects };
    info!(
      built = result.built(),
      failed = result.failed(),
      skipped = result.skipped(),
      "plan execution complete"
    );
    result
  }

  /// Build the ready projects of one wave in parallel.
  async fn execute_wave(
    &self,
    plan: &BuildPlan,
    names: &[String],
    semaphore: &Arc<Semaphore>,
    halted: &Arc<AtomicBool>,
    cancel: &CancellationToken,
  ) -> Vec<(String, ProjectOutcome)> {
    let mut join_set = JoinSet::new();

    for name in names {
      let Some(spec) = plan.get(name).cloned() else {
        continue;
      };
      let executor = self.clone();
      let semaphore = semaphore.clone();
      let halted = halted.clone();
      let cancel = cancel.clone();

      join_set.spawn(async move {
        let name = spec.name.clone();

        // Acquire the permit inside the task so waiting does not block dispatch.
        let Ok(_permit) = semaphore.acquire_owned().await else {
          return (name, ProjectOutcome::Skipped(SkipReason::Cancelled));
        };
        if cancel.is_cancelled() {
          return (name, ProjectOutcome::Skipped(SkipReason::Cancelled));
        }
        if halted.load(Ordering::SeqCst) {
          return (name, ProjectOutcome::Skipped(SkipReason::Halted));
        }

        let start = Instant::now();
        let outcome = match executor.build_project(&spec).await {
          Ok(built) => {
            info!(project = %name, steps = built.steps_run, "project built");
            ProjectOutcome::Built {
              info: built,
              duration: start.elapsed(),
            }
          }
          Err(e) => {
            error!(project = %name, error = %e, "project failed");
            if executor.config.policy == FailurePolicy::Halt {
              halted.store(true, Ordering::SeqCst);
            }
            ProjectOutcome::Failed {
              error: e,
              duration: start.elapsed(),
            }
          }
        };

        (name, outcome)
      });
    }

    let mut results = Vec::with_capacity(names.len());
    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok(result) => results.push(result),
        Err(e) => error!(error = %e, "build task panicked"),
      }
    }

    for name in names {
      if !results.iter().any(|(n, _)| n == name) {
        results.push((
          name.clone(),
          ProjectOutcome::Failed {
            error: ExecuteError::TaskAborted(name.clone()),
            duration: Duration::ZERO,
          },
        ));
      }
    }

    results
  }

  /// Acquire, configure and build a single project. Dependencies must
  /// already be installed into the prefix.
  pub async fn build_project(&self, spec: &ProjectSpec) -> Result<BuiltProject, ExecuteError> {
    let config = &*self.config;
    let vars = ProjectVars::new(config, spec);
    let build_dir = vars.build_dir().to_path_buf();

    info!(project = %spec.name, version = %spec.version, dir = %build_dir.display(), "building project");

    let acquired = self.acquirer.acquire(spec, &build_dir).await?;
    let env = env::build_env(&self.base_env, config, spec, &vars)?;

    let ctx = StepContext {
      vars: &vars,
      env: &env,
      build_dir: &build_dir,
      prefix: &config.prefix,
      shell: config.shell.as_deref(),
    };

    let mut steps_run = 0;
    for (index, step) in project_steps(spec).iter().enumerate() {
      if let Some(flag) = &step.when
        && !config.flag_enabled(flag)
      {
        debug!(project = %spec.name, step = index, flag = %flag, "flag disabled, skipping step");
        continue;
      }

      debug!(project = %spec.name, step = index, action = %step.describe(), "running step");
      actions::execute_action(&step.action, &ctx).await?;
      steps_run += 1;
    }

    Ok(BuiltProject {
      steps_run,
      reused_source: acquired.reused,
    })
  }
}

/// Execute a plan with a fresh [`Executor`].
pub async fn execute_plan(
  plan: &BuildPlan,
  config: ForgeConfig,
  cancel: &CancellationToken,
) -> Result<PlanResult, ExecuteError> {
  Ok(Executor::new(config)?.execute(plan, cancel).await)
}
