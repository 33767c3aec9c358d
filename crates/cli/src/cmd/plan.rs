//! Implementation of the `forge plan` command.

use anyhow::Result;
use clap::Args;

use super::{SourceArgs, TargetArgs, load_registry, resolve_targets};
use crate::output::{OutputFormat, print_json, print_stat, symbols};

#[derive(Args, Debug)]
pub struct PlanArgs {
  #[command(flatten)]
  pub targets: TargetArgs,

  #[command(flatten)]
  pub source: SourceArgs,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

pub fn cmd_plan(args: PlanArgs) -> Result<()> {
  let registry = load_registry(&args.source.recipes)?;
  let plan = resolve_targets(&registry, &args.targets)?;
  let waves = plan.waves();

  if args.output.is_json() {
    let json_output = serde_json::json!({
      "order": plan.names(),
      "requested": plan.requested(),
      "waves": waves,
    });
    return print_json(&json_output);
  }

  println!("Plan: {} project(s)", plan.len());
  for (index, spec) in plan.projects().iter().enumerate() {
    let marker = if plan.is_requested(&spec.name) { "*" } else { " " };
    println!("  {:>3}. {}{} {}", index + 1, marker, spec.name, spec.version);
  }

  println!();
  println!("Waves:");
  for (index, wave) in waves.iter().enumerate() {
    print_stat(&format!("{index}"), &wave.join(&format!(" {} ", symbols::INFO)));
  }

  Ok(())
}
