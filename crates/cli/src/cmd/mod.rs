mod build;
mod info;
mod list;
mod plan;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use forge_lib::config::ForgeConfig;
use forge_lib::registry::Registry;
use forge_lib::resolve::{BuildPlan, resolve, resolve_all};

pub use build::{BuildArgs, cmd_build};
pub use info::{InfoArgs, cmd_info};
pub use list::{ListArgs, cmd_list};
pub use plan::{PlanArgs, cmd_plan};

/// Where recipes and configuration come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
  /// Directory containing `*.toml` recipes
  #[arg(long, default_value = "recipes")]
  pub recipes: PathBuf,

  /// Configuration file (default: $FORGE_CONFIG or the platform config dir)
  #[arg(long)]
  pub config: Option<PathBuf>,
}

/// Which projects to plan.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
  /// Projects to build; their dependencies are included
  pub targets: Vec<String>,

  /// Select every registered recipe
  #[arg(long, conflicts_with = "targets")]
  pub all: bool,
}

pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
  ForgeConfig::load_or_default(path).context("Failed to load configuration")
}

pub fn load_registry(dir: &Path) -> Result<Registry> {
  let mut registry = Registry::new();
  registry
    .load_dir(dir)
    .with_context(|| format!("Failed to load recipes from {}", dir.display()))?;
  Ok(registry)
}

pub fn resolve_targets(registry: &Registry, targets: &TargetArgs) -> Result<BuildPlan> {
  let plan = if targets.all {
    resolve_all(registry)
  } else {
    resolve(registry, targets.targets.as_slice())
  };
  plan.context("Failed to resolve build plan")
}
