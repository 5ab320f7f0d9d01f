use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::project::ProjectError;

/// A named step of the external build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
  Restore,
  Publish,
}

impl BuildStep {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuildStep::Restore => "restore",
      BuildStep::Publish => "publish",
    }
  }
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Flags handed to the build collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFlags {
  /// Steps to run, in order.
  pub steps: Vec<BuildStep>,
  pub configuration: String,
  pub variant: String,
}

impl BuildFlags {
  /// The combined restore+publish directive every run uses.
  pub fn restore_and_publish(configuration: &str, variant: &str) -> Self {
    Self {
      steps: vec![BuildStep::Restore, BuildStep::Publish],
      configuration: configuration.to_string(),
      variant: variant.to_string(),
    }
  }

  /// Comma separated step list, e.g. `restore,publish`.
  pub fn steps_list(&self) -> String {
    self
      .steps
      .iter()
      .map(BuildStep::as_str)
      .collect::<Vec<_>>()
      .join(",")
  }
}

impl fmt::Display for BuildFlags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} configuration={} target={}",
      self.steps_list(),
      self.configuration,
      self.variant
    )
  }
}

/// What a successful build leaves behind.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
  /// Directory the artifacts were published to.
  pub publish_dir: PathBuf,
  /// Steps that actually ran (undeclared steps are skipped).
  pub steps_run: Vec<BuildStep>,
  /// Captured console output of all steps.
  pub output: String,
}

/// Errors that can occur while querying or running the external build.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The project descriptor could not be read.
  #[error(transparent)]
  Project(#[from] ProjectError),

  /// A build step exited with a non-zero status.
  #[error("{step} step failed with exit code {code:?}{}", format_output(.output))]
  Failed {
    step: BuildStep,
    code: Option<i32>,
    output: String,
  },

  /// A build step exceeded the configured timeout and was killed.
  #[error("{step} step timed out after {}", format_timeout(.timeout))]
  TimedOut { step: BuildStep, timeout: Duration },

  /// The shell for a build step could not be started.
  #[error("failed to spawn {step} step: {source}")]
  Spawn {
    step: BuildStep,
    #[source]
    source: std::io::Error,
  },

  /// I/O error while preparing the build.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

fn format_output(output: &str) -> String {
  if output.is_empty() {
    String::new()
  } else {
    format!(":\n{}", output)
  }
}

fn format_timeout(timeout: &Duration) -> String {
  humantime::format_duration(*timeout).to_string()
}

/// The build collaborator.
///
/// Implementations block the calling thread until the build finishes.
pub trait BuildOrchestrator: Send + Sync {
  /// Ordered target variants declared by the project.
  fn target_variants(&self, project: &Path) -> Result<Vec<String>, BuildError>;

  /// Run the build for `project` with `flags`.
  fn build(&self, project: &Path, flags: &BuildFlags) -> Result<BuildOutput, BuildError>;
}
