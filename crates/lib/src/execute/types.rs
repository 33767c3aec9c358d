//! Types for plan execution.
//!
//! This module defines the error type of a single project build and the
//! per-project outcomes collected while executing a plan.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::acquire::AcquireError;
use crate::placeholder::PlaceholderError;

/// Errors that abort a single project's build.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// A placeholder could not be resolved.
  #[error("placeholder error: {0}")]
  Placeholder(#[from] PlaceholderError),

  /// The source could not be acquired.
  #[error("acquisition failed: {0}")]
  Acquire(#[from] AcquireError),

  /// A build step exited unsuccessfully.
  #[error("step `{command}` failed with {}", exit_description(*code))]
  StepFailed {
    command: String,
    code: Option<i32>,
    /// Tail of the combined stdout and stderr.
    output: String,
  },

  /// A glob pattern in a step is malformed.
  #[error("invalid pattern '{pattern}': {message}")]
  Pattern { pattern: String, message: String },

  /// Copying artifacts into the prefix failed.
  #[error("install of {src} into {dest} failed: {reason}")]
  Install { src: String, dest: PathBuf, reason: String },

  /// I/O error while running a step.
  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The worker running the project stopped without reporting a result.
  #[error("build task aborted: {0}")]
  TaskAborted(String),
}

impl ExecuteError {
  /// Captured command output, for step failures.
  pub fn captured_output(&self) -> Option<&str> {
    match self {
      ExecuteError::StepFailed { output, .. } if !output.is_empty() => Some(output),
      _ => None,
    }
  }
}

fn exit_description(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "no exit code (terminated by signal)".to_string(),
  }
}

/// Why a project was not built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  /// A dependency failed, or was itself skipped because one of its own did.
  DependencyFailed(String),
  /// An earlier failure halted the plan.
  Halted,
  /// The run was cancelled before the project started.
  Cancelled,
  /// The project was excluded by request and is assumed to be installed.
  Excluded,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::DependencyFailed(dep) => write!(f, "dependency failed: {dep}"),
      SkipReason::Halted => write!(f, "halted after an earlier failure"),
      SkipReason::Cancelled => write!(f, "cancelled"),
      SkipReason::Excluded => write!(f, "excluded"),
    }
  }
}

/// A successful project build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltProject {
  /// Number of steps that ran; steps whose `when` flag was off are not counted.
  pub steps_run: usize,
  /// The build directory already held this source.
  pub reused_source: bool,
}

/// Outcome of one project in a plan.
#[derive(Debug)]
pub enum ProjectOutcome {
  Built { info: BuiltProject, duration: Duration },
  Failed { error: ExecuteError, duration: Duration },
  Skipped(SkipReason),
}

impl ProjectOutcome {
  pub fn is_built(&self) -> bool {
    matches!(self, ProjectOutcome::Built { .. })
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, ProjectOutcome::Failed { .. })
  }

  pub fn skip_reason(&self) -> Option<&SkipReason> {
    match self {
      ProjectOutcome::Skipped(reason) => Some(reason),
      _ => None,
    }
  }

  /// Whether dependents must be skipped with [`SkipReason::DependencyFailed`].
  ///
  /// Halted and cancelled projects do not count: their dependents are held
  /// back by the same halt or cancellation.
  pub(crate) fn blocks_dependents(&self) -> bool {
    matches!(
      self,
      ProjectOutcome::Failed { .. } | ProjectOutcome::Skipped(SkipReason::DependencyFailed(_))
    )
  }
}

/// Result of one project.
#[derive(Debug)]
pub struct ProjectResult {
  pub name: String,
  pub version: String,
  pub outcome: ProjectOutcome,
}

/// Result of executing a whole plan, in plan order.
#[derive(Debug, Default)]
pub struct PlanResult {
  pub projects: Vec<ProjectResult>,
}

impl PlanResult {
  /// True when every project was built or excluded.
  pub fn is_success(&self) -> bool {
    self
      .projects
      .iter()
      .all(|p| p.outcome.is_built() || p.outcome.skip_reason() == Some(&SkipReason::Excluded))
  }

  pub fn get(&self, name: &str) -> Option<&ProjectResult> {
    self.projects.iter().find(|p| p.name == name)
  }

  pub fn built(&self) -> usize {
    self.projects.iter().filter(|p| p.outcome.is_built()).count()
  }

  pub fn failed(&self) -> usize {
    self.projects.iter().filter(|p| p.outcome.is_failed()).count()
  }

  /// Skipped projects, excluded ones included.
  pub fn skipped(&self) -> usize {
    self.projects.iter().filter(|p| p.outcome.skip_reason().is_some()).count()
  }

  pub fn excluded(&self) -> usize {
    self
      .projects
      .iter()
      .filter(|p| p.outcome.skip_reason() == Some(&SkipReason::Excluded))
      .count()
  }

  pub fn total(&self) -> usize {
    self.projects.len()
  }

  /// The first failure in plan order.
  pub fn first_error(&self) -> Option<(&str, &ExecuteError)> {
    self.projects.iter().find_map(|p| match &p.outcome {
      ProjectOutcome::Failed { error, .. } => Some((p.name.as_str(), error)),
      _ => None,
    })
  }
}
