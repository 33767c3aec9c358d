//! Implementation of the `forge list` command.

use anyhow::Result;
use clap::Args;

use super::SourceArgs;
use super::load_registry;
use crate::output::{OutputFormat, print_info, print_json, symbols};

#[derive(Args, Debug)]
pub struct ListArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

pub fn cmd_list(args: ListArgs) -> Result<()> {
  let registry = load_registry(&args.source.recipes)?;

  if args.output.is_json() {
    let items: Vec<_> = registry
      .iter()
      .map(|spec| {
        serde_json::json!({
          "name": spec.name,
          "version": spec.version,
          "build": spec.build.as_str(),
          "dependencies": spec.dependencies,
        })
      })
      .collect();
    return print_json(&items);
  }

  if registry.is_empty() {
    print_info(&format!("No recipes found in {}", args.source.recipes.display()));
    return Ok(());
  }

  for spec in registry.iter() {
    if spec.dependencies.is_empty() {
      println!("{} {} ({})", spec.name, spec.version, spec.build.as_str());
    } else {
      println!(
        "{} {} ({}) {} {}",
        spec.name,
        spec.version,
        spec.build.as_str(),
        symbols::ARROW,
        spec.dependencies.join(", ")
      );
    }
  }

  Ok(())
}
