//! forge - dependency-aware recipe build orchestrator.

mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, InfoArgs, ListArgs, PlanArgs};
use output::print_error;

/// Build recipe projects in dependency order
#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build projects and everything they depend on
  Build(BuildArgs),

  /// Show the resolved build order without building
  Plan(PlanArgs),

  /// List registered recipes
  List(ListArgs),

  /// Show the effective configuration
  Info(InfoArgs),
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Build(args) => cmd::cmd_build(args),
    Commands::Plan(args) => cmd::cmd_plan(args).map(|()| ExitCode::SUCCESS),
    Commands::List(args) => cmd::cmd_list(args).map(|()| ExitCode::SUCCESS),
    Commands::Info(args) => cmd::cmd_info(args).map(|()| ExitCode::SUCCESS),
  };

  match result {
    Ok(code) => code,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
