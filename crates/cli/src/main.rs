use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::{FAILURE_EXIT_CODE, RunArgs, cmd_run, cmd_targets};
use output::{OutputFormat, print_error};

/// projrun - build a project and run its entry point in-process
#[derive(Parser)]
#[command(name = "projrun")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Log filter directive, e.g. `projrun_lib=trace` (overrides --verbose and RUST_LOG)
  #[arg(long, global = true, value_name = "FILTER")]
  log_level: Option<String>,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a project and call its entry point, exiting with its exit code
  Run(RunArgs),

  /// List the target variants a project declares
  Targets {
    /// Path to the project descriptor
    project: PathBuf,
  },
}

fn main() {
  let cli = Cli::parse();

  init_tracing(cli.verbose, cli.log_level.as_deref());

  let result = match cli.command {
    Commands::Run(args) => cmd_run(args, cli.format),
    Commands::Targets { project } => cmd_targets(&project, cli.format).map(|_| 0),
  };

  let code = match result {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      FAILURE_EXIT_CODE
    }
  };

  std::process::exit(code);
}

/// Logs go to stderr so stdout stays free for the hosted code and JSON reports.
fn init_tracing(verbose: bool, log_level: Option<&str>) {
  let filter = match log_level {
    Some(directive) => EnvFilter::new(directive),
    None if verbose => EnvFilter::new("debug"),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
