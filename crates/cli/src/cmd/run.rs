//! Implementation of the `projrun run` command.
//!
//! Builds the project, loads its entry artifact and calls the entry point. The
//! process exits with the entry point's exit code, or 1 when any stage fails.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use projrun_lib::config::RunnerConfig;
use projrun_lib::consts::DEFAULT_ENTRY_METHOD;
use projrun_lib::runner::{EntryPoint, ErrorKind, Runner};

use crate::output::{OutputFormat, format_failure, print_error, print_json};

/// Exit code reported when the pipeline fails.
pub const FAILURE_EXIT_CODE: i32 = 1;

#[derive(Debug, Args)]
pub struct RunArgs {
  /// Path to the project descriptor
  pub project: PathBuf,

  /// Name of the entry artifact, without extension
  pub assembly: String,

  /// Fully qualified name of the entry class
  pub class: String,

  /// Entry method to call
  #[arg(short, long, default_value = DEFAULT_ENTRY_METHOD)]
  pub method: String,

  /// Build configuration [env: PROJRUN_CONFIGURATION]
  #[arg(short, long)]
  pub configuration: Option<String>,

  /// Shell used for build steps [env: PROJRUN_SHELL]
  #[arg(long)]
  pub shell: Option<String>,

  /// Kill build steps running longer than this, e.g. 90s or 5m [env: PROJRUN_BUILD_TIMEOUT]
  #[arg(long, value_parser = humantime::parse_duration)]
  pub build_timeout: Option<Duration>,

  /// Arguments passed to the entry method
  #[arg(last = true)]
  pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RunReport {
  exit_code: i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<FailureReport>,
}

#[derive(Debug, Serialize)]
struct FailureReport {
  kind: ErrorKind,
  message: String,
}

/// Execute the run command and return the process exit code.
pub fn cmd_run(args: RunArgs, format: OutputFormat) -> Result<i32> {
  let config = runner_config(&args)?;
  debug!(config = ?config, "runner configuration");

  let runner = Runner::from_config(config);
  let entry = EntryPoint::new(args.assembly, args.class)
    .with_method(args.method)
    .with_args(args.args);

  let report = match runner.run(&args.project, &entry) {
    Ok(exit_code) => RunReport {
      exit_code,
      error: None,
    },
    Err(err) => RunReport {
      exit_code: FAILURE_EXIT_CODE,
      error: Some(FailureReport {
        kind: err.kind(),
        message: err.to_string(),
      }),
    },
  };

  if format.is_json() {
    print_json(&report)?;
  } else if let Some(failure) = &report.error {
    print_error(&format_failure(failure.kind.as_str(), &failure.message));
  }

  Ok(report.exit_code)
}

/// Environment configuration overridden by command line flags.
fn runner_config(args: &RunArgs) -> Result<RunnerConfig> {
  let mut config = RunnerConfig::from_env().context("Invalid configuration in environment")?;

  if let Some(configuration) = &args.configuration {
    config = config.with_configuration(configuration);
  }
  if let Some(shell) = &args.shell {
    config = config.with_shell(shell);
  }
  if let Some(timeout) = args.build_timeout {
    config = config.with_build_timeout(timeout);
  }

  Ok(config)
}
