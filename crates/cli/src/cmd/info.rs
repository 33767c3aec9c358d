//! Implementation of the `forge info` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use forge_lib::platform::{host_triple, paths};

use super::load_config;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Args, Debug)]
pub struct InfoArgs {
  /// Configuration file (default: $FORGE_CONFIG or the platform config dir)
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

pub fn cmd_info(args: InfoArgs) -> Result<()> {
  let config = load_config(args.config.as_deref())?;
  let config_path = args.config.unwrap_or_else(paths::config_file);

  if args.output.is_json() {
    let json_output = serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "host": host_triple(),
      "config_file": config_path,
      "config": config,
    });
    return print_json(&json_output);
  }

  println!("forge {}", env!("CARGO_PKG_VERSION"));
  print_stat("Host", &host_triple());
  print_stat("Config file", &config_path.display().to_string());
  println!();
  print_stat("Prefix", &config.prefix.display().to_string());
  print_stat("Build root", &config.build_root.display().to_string());
  print_stat("Cache", &config.cache_dir.display().to_string());
  if let Some(root) = &config.toolchain_root {
    print_stat("Toolchain", &root.display().to_string());
  }
  if let Some(python) = &config.python_dir {
    print_stat("Python", &python.display().to_string());
  }
  print_stat("Policy", &config.policy.to_string());
  print_stat("Jobs", &config.jobs.to_string());
  print_stat("Python wheels", &config.py_wheel.to_string());
  if !config.skip.is_empty() {
    print_stat("Skip", &config.skip.iter().cloned().collect::<Vec<_>>().join(", "));
  }

  Ok(())
}
