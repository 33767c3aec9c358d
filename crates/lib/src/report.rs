//! Build summary.
//!
//! Condenses a [`PlanResult`] into per-project rows, aggregate counts and
//! the first fatal error. Serializes to JSON for `--output json`.

use serde::Serialize;

use crate::execute::{PlanResult, ProjectOutcome, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Built,
  Failed,
  Skipped,
  Excluded,
}

impl Status {
  pub fn as_str(&self) -> &'static str {
    match self {
      Status::Built => "built",
      Status::Failed => "failed",
      Status::Skipped => "skipped",
      Status::Excluded => "excluded",
    }
  }
}

/// One project's line in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
  pub name: String,
  pub version: String,
  pub status: Status,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<u64>,
  /// Error message for failures, reason for skips.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
  /// Captured output of a failed step.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<String>,
}

/// The first failure of the run, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstError {
  pub project: String,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub success: bool,
  pub total: usize,
  pub built: usize,
  pub failed: usize,
  /// Skipped projects, excluded ones included.
  pub skipped: usize,
  pub excluded: usize,
  pub projects: Vec<ProjectReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_error: Option<FirstError>,
}

impl Summary {
  pub fn from_result(result: &PlanResult) -> Self {
    let projects = result
      .projects
      .iter()
      .map(|p| {
        let (status, duration, detail, output) = match &p.outcome {
          ProjectOutcome::Built { duration, .. } => (Status::Built, Some(*duration), None, None),
          ProjectOutcome::Failed { error, duration } => (
            Status::Failed,
            Some(*duration),
            Some(error.to_string()),
            error.captured_output().map(str::to_string),
          ),
          ProjectOutcome::Skipped(SkipReason::Excluded) => (Status::Excluded, None, None, None),
          ProjectOutcome::Skipped(reason) => (Status::Skipped, None, Some(reason.to_string()), None),
        };

        ProjectReport {
          name: p.name.clone(),
          version: p.version.clone(),
          status,
          duration_ms: duration.map(|d| d.as_millis() as u64),
          detail,
          output,
        }
      })
      .collect();

    Self {
      success: result.is_success(),
      total: result.total(),
      built: result.built(),
      failed: result.failed(),
      skipped: result.skipped(),
      excluded: result.excluded(),
      projects,
      first_error: result.first_error().map(|(project, error)| FirstError {
        project: project.to_string(),
        message: error.to_string(),
      }),
    }
  }

  /// Process exit code: 0 when every project was built or excluded.
  pub fn exit_code(&self) -> i32 {
    if self.success { 0 } else { 1 }
  }
}
