use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::build::BuildError;
use crate::consts::DEFAULT_ENTRY_METHOD;
use crate::loader::LoadError;
use crate::project::ProjectError;
use crate::resolve::{InvokeError, ResolveError};

/// What to call once the artifact is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
  /// Artifact name without extension.
  pub assembly_name: String,
  /// Fully qualified type name.
  pub class_name: String,
  pub method_name: String,
  pub args: Vec<String>,
}

impl EntryPoint {
  /// Entry point calling `Main` with no arguments.
  pub fn new(assembly_name: impl Into<String>, class_name: impl Into<String>) -> Self {
    Self {
      assembly_name: assembly_name.into(),
      class_name: class_name.into(),
      method_name: DEFAULT_ENTRY_METHOD.to_string(),
      args: Vec::new(),
    }
  }

  pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
    self.method_name = method_name.into();
    self
  }

  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }
}

/// Coarse classification of a [`RunError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  ProjectNotFound,
  InvalidProject,
  BuildFailed,
  ArtifactNotFound,
  LoadFailed,
  TypeNotFound,
  MethodNotFound,
  EntryPointFailed,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::ProjectNotFound => "project_not_found",
      ErrorKind::InvalidProject => "invalid_project",
      ErrorKind::BuildFailed => "build_failed",
      ErrorKind::ArtifactNotFound => "artifact_not_found",
      ErrorKind::LoadFailed => "load_failed",
      ErrorKind::TypeNotFound => "type_not_found",
      ErrorKind::MethodNotFound => "method_not_found",
      ErrorKind::EntryPointFailed => "entry_point_failed",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Errors that abort a run. Every stage failure is terminal.
#[derive(Debug, Error)]
pub enum RunError {
  /// The project path could not be resolved or its descriptor is unusable.
  #[error(transparent)]
  Project(#[from] ProjectError),

  /// The external build failed.
  #[error("build failed: {0}")]
  BuildFailed(#[from] BuildError),

  /// The artifact could not be found or loaded.
  #[error(transparent)]
  Load(#[from] LoadError),

  /// The entry point type or method does not exist.
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  /// The hosted code failed.
  #[error(transparent)]
  EntryPointFailed(#[from] InvokeError),
}

impl RunError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      RunError::Project(err) | RunError::BuildFailed(BuildError::Project(err)) => match err {
        ProjectError::NotFound { .. } => ErrorKind::ProjectNotFound,
        ProjectError::InvalidDescriptor { .. } | ProjectError::NoTargetVariants { .. } => {
          ErrorKind::InvalidProject
        }
      },
      RunError::BuildFailed(_) => ErrorKind::BuildFailed,
      RunError::Load(LoadError::ArtifactNotFound { .. }) => ErrorKind::ArtifactNotFound,
      RunError::Load(LoadError::LoadFailed { .. } | LoadError::ContextFailed { .. }) => ErrorKind::LoadFailed,
      RunError::Resolve(ResolveError::TypeNotFound { .. }) => ErrorKind::TypeNotFound,
      RunError::Resolve(ResolveError::MethodNotFound { .. }) => ErrorKind::MethodNotFound,
      RunError::EntryPointFailed(_) => ErrorKind::EntryPointFailed,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn entry_point_defaults_to_main() {
    let entry = EntryPoint::new("Foo", "Foo.EntryPointStubClass");
    assert_eq!(entry.method_name, "Main");
    assert!(entry.args.is_empty());

    let entry = entry.with_method("Run").with_args(["10", "20"]);
    assert_eq!(entry.method_name, "Run");
    assert_eq!(entry.args, vec!["10", "20"]);
  }

  #[test]
  fn kind_classifies_nested_errors() {
    let missing = RunError::from(BuildError::Project(ProjectError::NotFound {
      path: PathBuf::from("Foo.proj.lua"),
      source: std::io::Error::from(std::io::ErrorKind::NotFound),
    }));
    assert_eq!(missing.kind(), ErrorKind::ProjectNotFound);

    let no_variants = RunError::from(ProjectError::NoTargetVariants {
      path: PathBuf::from("Foo.proj.lua"),
    });
    assert_eq!(no_variants.kind(), ErrorKind::InvalidProject);

    let artifact = RunError::from(LoadError::ArtifactNotFound {
      path: PathBuf::from("Foo.lua"),
    });
    assert_eq!(artifact.kind(), ErrorKind::ArtifactNotFound);

    let type_missing = RunError::from(ResolveError::TypeNotFound {
      class_name: "Foo.Bar".to_string(),
      artifact_name: "Foo".to_string(),
    });
    assert_eq!(type_missing.kind(), ErrorKind::TypeNotFound);
    assert_eq!(type_missing.kind().to_string(), "type_not_found");
  }
}
