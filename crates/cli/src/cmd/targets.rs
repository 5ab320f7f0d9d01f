//! Implementation of the `projrun targets` command.
//!
//! Lists the target variants a project declares, marking the one a run builds.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use projrun_lib::config::RunnerConfig;
use projrun_lib::runner::Runner;

use crate::output::{OutputFormat, print_info, print_json, print_selected};

#[derive(Debug, Serialize)]
struct TargetsReport<'a> {
  project: &'a Path,
  targets: &'a [String],
  selected: &'a str,
}

pub fn cmd_targets(project: &Path, format: OutputFormat) -> Result<()> {
  let runner = Runner::from_config(RunnerConfig::from_env()?);
  let project = runner
    .resolve_project(project)
    .map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

  if format.is_json() {
    return print_json(&TargetsReport {
      project: project.path(),
      targets: project.variants(),
      selected: project.canonical_variant(),
    });
  }

  for (index, variant) in project.variants().iter().enumerate() {
    if index == 0 {
      print_selected(&format!("{} (selected)", variant));
    } else {
      print_info(variant);
    }
  }

  Ok(())
}
