//! Project descriptors and build output locations.
//!
//! A project is identified by the absolute path of its descriptor file. The
//! descriptor itself is a Lua file (see [`descriptor`]) that declares the
//! target variants the project can be built for and the shell commands that
//! restore and publish it.
//!
//! # Submodules
//!
//! - [`descriptor`] - Evaluation of descriptor files into a [`ProjectManifest`]

pub mod descriptor;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::{ARTIFACT_EXTENSION, BIN_DIR, PUBLISH_DIR};

pub use descriptor::{ProjectManifest, read_manifest};

/// Errors raised while resolving or reading a project descriptor.
#[derive(Debug, Error)]
pub enum ProjectError {
  /// The user supplied path does not point to an existing file.
  #[error("project file not found: {path}")]
  NotFound {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The descriptor could not be evaluated or has the wrong shape.
  #[error("invalid project descriptor {path}: {message}")]
  InvalidDescriptor { path: PathBuf, message: String },

  /// The descriptor declares no target variant.
  #[error("project {path} declares no target variants")]
  NoTargetVariants { path: PathBuf },
}

/// Resolve a user supplied project path to an absolute, canonical path.
///
/// Uses `dunce` so Windows paths stay free of the `\\?\` prefix.
pub fn resolve_project_path(path: &Path) -> Result<PathBuf, ProjectError> {
  let resolved = dunce::canonicalize(path).map_err(|source| ProjectError::NotFound {
    path: path.to_path_buf(),
    source,
  })?;

  if !resolved.is_file() {
    return Err(ProjectError::NotFound {
      path: path.to_path_buf(),
      source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
    });
  }

  Ok(resolved)
}

/// A resolved project: descriptor path, its directory and its declared variants.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
  path: PathBuf,
  directory: PathBuf,
  variants: Vec<String>,
}

impl ProjectDescriptor {
  /// Create a descriptor from an absolute descriptor path and its ordered variants.
  pub fn new(path: PathBuf, variants: Vec<String>) -> Result<Self, ProjectError> {
    if variants.is_empty() {
      return Err(ProjectError::NoTargetVariants { path });
    }

    let directory = path
      .parent()
      .map(Path::to_path_buf)
      .ok_or_else(|| ProjectError::InvalidDescriptor {
        path: path.clone(),
        message: "descriptor path has no parent directory".to_string(),
      })?;

    Ok(Self {
      path,
      directory,
      variants,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn variants(&self) -> &[String] {
    &self.variants
  }

  /// The variant a run builds and loads: always the first declared one.
  ///
  /// No negotiation against the host runtime takes place.
  pub fn canonical_variant(&self) -> &str {
    &self.variants[0]
  }
}

/// Directory the build writes artifacts to for a configuration and variant.
pub fn publish_dir(project_dir: &Path, configuration: &str, variant: &str) -> PathBuf {
  project_dir
    .join(BIN_DIR)
    .join(configuration)
    .join(variant)
    .join(PUBLISH_DIR)
}

/// Location of a built artifact.
///
/// `{projectDir}/bin/{configuration}/{variant}/publish/{artifactName}.lua`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
  name: String,
  directory: PathBuf,
  path: PathBuf,
}

impl ArtifactLocation {
  pub fn new(project_dir: &Path, configuration: &str, variant: &str, artifact_name: &str) -> Self {
    let directory = publish_dir(project_dir, configuration, variant);
    let path = directory.join(format!("{}.{}", artifact_name, ARTIFACT_EXTENSION));
    Self {
      name: artifact_name.to_string(),
      directory,
      path,
    }
  }

  /// Name the artifact was requested by, without extension.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Publish directory containing the artifact.
  pub fn directory(&self) -> &Path {
    &self.directory
  }

  /// Full path of the artifact file.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn artifact_location_layout() {
    let location = ArtifactLocation::new(Path::new("/work/Foo"), "release", "lua54", "Foo");

    assert_eq!(location.name(), "Foo");
    assert_eq!(
      location.directory(),
      Path::new("/work/Foo/bin/release/lua54/publish")
    );
    assert_eq!(
      location.path(),
      Path::new("/work/Foo/bin/release/lua54/publish/Foo.lua")
    );
  }

  #[test]
  fn canonical_variant_is_first_declared() {
    let descriptor = ProjectDescriptor::new(
      PathBuf::from("/work/Foo/Foo.proj.lua"),
      vec!["luajit".to_string(), "lua54".to_string()],
    )
    .unwrap();

    assert_eq!(descriptor.canonical_variant(), "luajit");
    assert_eq!(descriptor.directory(), Path::new("/work/Foo"));
  }

  #[test]
  fn descriptor_requires_a_variant() {
    let result = ProjectDescriptor::new(PathBuf::from("/work/Foo/Foo.proj.lua"), Vec::new());
    assert!(matches!(result, Err(ProjectError::NoTargetVariants { .. })));
  }

  #[test]
  fn resolve_missing_project_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = resolve_project_path(&temp_dir.path().join("missing.proj.lua"));
    assert!(matches!(result, Err(ProjectError::NotFound { .. })));
  }

  #[test]
  fn resolve_directory_is_not_a_project() {
    let temp_dir = TempDir::new().unwrap();
    let result = resolve_project_path(temp_dir.path());
    assert!(matches!(result, Err(ProjectError::NotFound { .. })));
  }

  #[test]
  fn resolve_returns_absolute_path() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("Foo.proj.lua");
    std::fs::write(&file, "return {}").unwrap();

    let resolved = resolve_project_path(&file).unwrap();
    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("Foo.proj.lua"));
  }
}
