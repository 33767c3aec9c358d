//! Implementation of the `forge build` command.
//!
//! Resolves the requested projects, builds them wave by wave and prints a
//! per-project summary. The exit code is non-zero unless every project was
//! built or excluded.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Stream};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use forge_lib::config::{FailurePolicy, ForgeConfig};
use forge_lib::execute::Executor;
use forge_lib::report::{ProjectReport, Status, Summary};

use super::{SourceArgs, TargetArgs, load_config, load_registry, resolve_targets};
use crate::output::{OutputFormat, format_duration, print_error, print_info, print_json, print_warning, symbols};

/// Failure policy as spelled on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
  Halt,
  BestEffort,
}

impl From<PolicyArg> for FailurePolicy {
  fn from(arg: PolicyArg) -> Self {
    match arg {
      PolicyArg::Halt => FailurePolicy::Halt,
      PolicyArg::BestEffort => FailurePolicy::BestEffort,
    }
  }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
  #[command(flatten)]
  pub targets: TargetArgs,

  #[command(flatten)]
  pub source: SourceArgs,

  /// What to do after a project fails
  #[arg(long, value_enum)]
  pub policy: Option<PolicyArg>,

  /// Maximum number of projects built at once
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Treat a project as already installed (repeatable)
  #[arg(long = "skip", value_name = "NAME")]
  pub skip: Vec<String>,

  /// Wipe build directories before acquiring sources
  #[arg(long)]
  pub clean: bool,

  /// Package Python bindings as wheels
  #[arg(long)]
  pub py_wheel: bool,

  /// Install prefix
  #[arg(long)]
  pub prefix: Option<PathBuf>,

  /// Root for per-project build directories
  #[arg(long)]
  pub build_root: Option<PathBuf>,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

impl BuildArgs {
  /// Layer command-line flags over the loaded configuration.
  fn apply_to(&self, config: &mut ForgeConfig) {
    if let Some(policy) = self.policy {
      config.policy = policy.into();
    }
    if let Some(jobs) = self.jobs {
      config.jobs = jobs;
    }
    if let Some(prefix) = &self.prefix {
      config.prefix = prefix.clone();
    }
    if let Some(build_root) = &self.build_root {
      config.build_root = build_root.clone();
    }
    config.skip.extend(self.skip.iter().cloned());
    config.clean |= self.clean;
    config.py_wheel |= self.py_wheel;
  }
}

pub fn cmd_build(args: BuildArgs) -> Result<ExitCode> {
  let mut config = load_config(args.source.config.as_deref())?;
  args.apply_to(&mut config);
  config.validate().context("Invalid configuration")?;

  let registry = load_registry(&args.source.recipes)?;
  for name in &config.skip {
    if !registry.contains(name) {
      print_warning(&format!("--skip {name}: no such recipe"));
    }
  }

  let plan = resolve_targets(&registry, &args.targets)?;
  let json = args.output.is_json();

  if !json {
    print_info(&format!("Building {} project(s): {}", plan.len(), plan.names().join(", ")));
  }

  let executor = Executor::new(config).context("Failed to set up executor")?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(async {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, finishing running projects");
        on_interrupt.cancel();
      }
    });

    executor.execute(&plan, &cancel).await
  });

  let summary = Summary::from_result(&result);

  if json {
    print_json(&summary)?;
  } else {
    print_summary(&summary);
  }

  Ok(ExitCode::from(summary.exit_code() as u8))
}

fn print_summary(summary: &Summary) {
  println!();
  for project in &summary.projects {
    print_project(project);
  }

  println!();
  println!(
    "{} built, {} failed, {} skipped ({} excluded) of {}",
    summary.built, summary.failed, summary.skipped, summary.excluded, summary.total
  );

  if let Some(first) = &summary.first_error {
    print_error(&format!("{} failed: {}", first.project, first.message));
  }
}

fn print_project(project: &ProjectReport) {
  let symbol = match project.status {
    Status::Built => symbols::SUCCESS
      .if_supports_color(Stream::Stdout, |s| s.green())
      .to_string(),
    Status::Failed => symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
    Status::Skipped => symbols::SKIP
      .if_supports_color(Stream::Stdout, |s| s.yellow())
      .to_string(),
    Status::Excluded => symbols::SKIP
      .if_supports_color(Stream::Stdout, |s| s.dimmed())
      .to_string(),
  };

  let mut line = format!("{} {} {}", symbol, project.name, project.version);
  if let Some(ms) = project.duration_ms {
    line.push_str(&format!(" ({})", format_duration(std::time::Duration::from_millis(ms))));
  }
  match project.status {
    Status::Excluded => line.push_str(" excluded"),
    _ => {
      if let Some(detail) = &project.detail {
        line.push_str(&format!(": {detail}"));
      }
    }
  }
  println!("{line}");

  if let Some(output) = &project.output {
    for text in output.lines() {
      println!("    {}", text.if_supports_color(Stream::Stdout, |s| s.dimmed()));
    }
  }
}
