//! The build → load → invoke pipeline.
//!
//! [`Runner::run`] executes these stages strictly in order, aborting on the first
//! failure:
//!
//! 1. Resolve the project path and query its target variants; the first is used
//! 2. Restore and publish the project with the configured build configuration
//! 3. Compute the artifact location inside the publish directory
//! 4. Create a fresh [`IsolatedContext`](crate::loader::IsolatedContext) and load the artifact
//! 5. Resolve the entry point type and method
//! 6. Invoke it and translate the returned value into an exit code
//!
//! There are no retries and no partial results. A failed build returns before any
//! context is created. The context lives only for the duration of a single run.

mod types;

use std::path::Path;

use tracing::{debug, info};

use crate::build::{BuildFlags, BuildOrchestrator, BuildOutput, ShellBuildOrchestrator};
use crate::config::RunnerConfig;
use crate::loader::{ContextFactory, DefaultContextFactory, LoadError};
use crate::project::{ArtifactLocation, ProjectDescriptor, resolve_project_path};
use crate::resolve::{ExitStatus, resolve};

pub use types::{EntryPoint, ErrorKind, RunError};

/// Runs entry points of projects built on demand.
///
/// Collaborators are passed in explicitly. A runner holds no per-run state, so it
/// can be shared between threads and used for concurrent runs.
#[derive(Debug, Clone)]
pub struct Runner<B = ShellBuildOrchestrator, F = DefaultContextFactory> {
  orchestrator: B,
  factory: F,
  config: RunnerConfig,
}

impl Runner {
  /// Runner with the shell build orchestrator and plain contexts.
  pub fn from_config(config: RunnerConfig) -> Self {
    Self::new(ShellBuildOrchestrator::new(&config), DefaultContextFactory, config)
  }
}

impl<B: BuildOrchestrator, F: ContextFactory> Runner<B, F> {
  pub fn new(orchestrator: B, factory: F, config: RunnerConfig) -> Self {
    Self {
      orchestrator,
      factory,
      config,
    }
  }

  pub fn config(&self) -> &RunnerConfig {
    &self.config
  }

  pub fn orchestrator(&self) -> &B {
    &self.orchestrator
  }

  pub fn factory(&self) -> &F {
    &self.factory
  }

  /// Build `project_path`, load the entry artifact and call the entry point.
  ///
  /// Returns the integer the entry point returned, or 0 if it returned nothing.
  /// Blocks until both the build and the entry point finish.
  pub fn run(&self, project_path: &Path, entry: &EntryPoint) -> Result<i32, RunError> {
    self.run_status(project_path, entry).map(ExitStatus::code)
  }

  /// Like [`run`](Self::run) but keeps the distinction between an explicit code and no result.
  pub fn run_status(&self, project_path: &Path, entry: &EntryPoint) -> Result<ExitStatus, RunError> {
    info!(
      project = %project_path.display(),
      args = %entry.args.join(","),
      "running project"
    );

    let project = self.resolve_project(project_path)?;
    self.publish(&project)?;

    let location = self.artifact_location(&project, &entry.assembly_name);
    let status = self.execute(&location, entry)?;

    info!(exit_code = status.code(), "run finished");
    Ok(status)
  }

  /// Resolve the project path and its declared target variants.
  pub fn resolve_project(&self, project_path: &Path) -> Result<ProjectDescriptor, RunError> {
    let path = resolve_project_path(project_path)?;
    let variants = self.orchestrator.target_variants(&path)?;
    Ok(ProjectDescriptor::new(path, variants)?)
  }

  /// Restore and publish `project` for its canonical variant.
  pub fn publish(&self, project: &ProjectDescriptor) -> Result<BuildOutput, RunError> {
    let variant = project.canonical_variant();
    debug!(variant = %variant, project = %project.path().display(), "publishing project");

    let flags = BuildFlags::restore_and_publish(&self.config.configuration, variant);
    Ok(self.orchestrator.build(project.path(), &flags)?)
  }

  /// Where the entry artifact of `project` is published.
  pub fn artifact_location(&self, project: &ProjectDescriptor, assembly_name: &str) -> ArtifactLocation {
    ArtifactLocation::new(
      project.directory(),
      &self.config.configuration,
      project.canonical_variant(),
      assembly_name,
    )
  }

  /// Load, resolve and invoke inside one fresh context.
  fn execute(&self, location: &ArtifactLocation, entry: &EntryPoint) -> Result<ExitStatus, RunError> {
    debug!(
      artifact = %location.path().display(),
      directory = %location.directory().display(),
      "loading entry artifact"
    );

    if !location.directory().is_dir() {
      return Err(LoadError::ArtifactNotFound {
        path: location.path().to_path_buf(),
      }
      .into());
    }

    let context = self.factory.create(location.directory())?;
    let artifact = context.load(location.path())?;

    debug!(
      context = %context.id(),
      method = %entry.method_name,
      class = %entry.class_name,
      artifact = %artifact.name(),
      args = %entry.args.join(","),
      "running entry method"
    );

    let entry_point = resolve(&artifact, &entry.class_name, &entry.method_name).into_result()?;
    Ok(entry_point.invoke(&entry.args)?)
  }
}
