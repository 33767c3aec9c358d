//! Step dispatch.
//!
//! Resolves placeholders in a recipe step and hands it to the matching
//! action: shell command, per-file command, or install.

pub mod cmd;
pub mod install;

use std::path::Path;

use tracing::{debug, warn};

use crate::env::{Env, ProjectVars};
use crate::execute::resolver::StepResolver;
use crate::execute::types::ExecuteError;
use crate::placeholder;
use crate::recipe::StepAction;

pub use cmd::execute_cmd;
pub use install::{glob_in, install_dir, install_files};

/// Everything a step needs from its project.
pub struct StepContext<'a> {
  pub vars: &'a ProjectVars,
  pub env: &'a Env,
  pub build_dir: &'a Path,
  pub prefix: &'a Path,
  pub shell: Option<&'a str>,
}

/// Execute a single step action.
pub async fn execute_action(action: &StepAction, ctx: &StepContext<'_>) -> Result<(), ExecuteError> {
  let resolver = StepResolver::new(ctx.vars, ctx.env);

  match action {
    StepAction::Cmd { cmd, cwd, env } => {
      let resolved_cmd = placeholder::substitute(cmd, &resolver)?;

      let working_dir = match cwd {
        Some(cwd) => ctx.build_dir.join(placeholder::substitute(cwd, &resolver)?),
        None => ctx.build_dir.to_path_buf(),
      };

      if env.is_empty() {
        execute_cmd(&resolved_cmd, ctx.env, &working_dir, ctx.shell).await?;
      } else {
        let mut step_env = ctx.env.clone();
        for (key, value) in env {
          step_env.insert(key.clone(), placeholder::substitute(value, &resolver)?);
        }
        execute_cmd(&resolved_cmd, &step_env, &working_dir, ctx.shell).await?;
      }
    }

    StepAction::ForEach { pattern, cmd } => {
      let resolved_pattern = placeholder::substitute(pattern, &resolver)?;
      let matches = glob_in(ctx.build_dir, &resolved_pattern)?;

      if matches.is_empty() {
        warn!(pattern = %resolved_pattern, "for_each pattern matched nothing");
      }

      for path in matches {
        let item = path.strip_prefix(ctx.build_dir).unwrap_or(&path).display().to_string();
        debug!(item = %item, "for_each item");
        let resolved_cmd = placeholder::substitute(cmd, &resolver.with_item(&item))?;
        execute_cmd(&resolved_cmd, ctx.env, ctx.build_dir, ctx.shell).await?;
      }
    }

    StepAction::Install { src, dest } => {
      let src = placeholder::substitute(src, &resolver)?;
      let dest = ctx.prefix.join(placeholder::substitute(dest, &resolver)?);
      let build_dir = ctx.build_dir.to_path_buf();
      run_blocking(move || install_files(&build_dir, &src, &dest)).await?;
    }

    StepAction::InstallDir { src, dest } => {
      let src = placeholder::substitute(src, &resolver)?;
      let dest = ctx.prefix.join(placeholder::substitute(dest, &resolver)?);
      let build_dir = ctx.build_dir.to_path_buf();
      run_blocking(move || install_dir(&build_dir, &src, &dest)).await?;
    }
  }

  Ok(())
}

/// Run a filesystem copy on the blocking pool so it does not stall other builds.
async fn run_blocking<F>(copy: F) -> Result<usize, ExecuteError>
where
  F: FnOnce() -> Result<usize, ExecuteError> + Send + 'static,
{
  tokio::task::spawn_blocking(copy)
    .await
    .map_err(|e| ExecuteError::TaskAborted(e.to_string()))?
}
