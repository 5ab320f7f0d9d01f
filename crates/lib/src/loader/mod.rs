//! Isolated artifact loading.
//!
//! Every run loads its artifact into a brand new [`IsolatedContext`]: a Lua VM
//! whose module search path is scoped to the artifact directory. Nothing loaded
//! through one context is visible to, or comparable with, anything loaded through
//! another one. Module caches, globals and type tables all live and die with the
//! context.
//!
//! The context owns everything it loads. [`LoadedArtifact`] borrows its context,
//! so no loaded type can outlive the VM that produced it, and dropping the context
//! closes the VM on every exit path.
//!
//! The isolation is about namespaces and state only. It is not a security
//! boundary.
//!
//! # Submodules
//!
//! - [`runtime`] - Lua VM creation and chunk evaluation

pub mod runtime;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an [`IsolatedContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
  fn next() -> Self {
    Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
  }

  pub fn as_u64(&self) -> u64 {
    self.0
  }
}

impl fmt::Display for ContextId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ctx-{}", self.0)
  }
}

/// Errors raised while creating a context or loading an artifact into it.
#[derive(Debug, Error)]
pub enum LoadError {
  /// The context directory is unusable or the VM could not be initialised.
  #[error("cannot create isolated context for {directory}: {message}")]
  ContextFailed { directory: PathBuf, message: String },

  /// The artifact file does not exist.
  #[error("artifact not found: {path}")]
  ArtifactNotFound { path: PathBuf },

  /// The artifact exists but is not a loadable artifact.
  #[error("failed to load artifact {path}: {message}")]
  LoadFailed { path: PathBuf, message: String },
}

/// A disposable loading boundary scoped to one directory.
pub struct IsolatedContext {
  id: ContextId,
  directory: PathBuf,
  lua: Lua,
}

impl fmt::Debug for IsolatedContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("IsolatedContext")
      .field("id", &self.id)
      .field("directory", &self.directory)
      .finish_non_exhaustive()
  }
}

impl IsolatedContext {
  /// Create a fresh context scoped to `directory`.
  pub fn new(directory: &Path) -> Result<Self, LoadError> {
    let context_failed = |message: String| LoadError::ContextFailed {
      directory: directory.to_path_buf(),
      message,
    };

    let directory = dunce::canonicalize(directory).map_err(|e| context_failed(e.to_string()))?;
    if !directory.is_dir() {
      return Err(context_failed("not a directory".to_string()));
    }

    let id = ContextId::next();
    let lua = runtime::create_runtime(id, &directory).map_err(|e| context_failed(e.to_string()))?;

    debug!(context = %id, directory = %directory.display(), "created isolated context");

    Ok(Self { id, directory, lua })
  }

  pub fn id(&self) -> ContextId {
    self.id
  }

  /// Canonical directory the context is scoped to.
  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub(crate) fn lua(&self) -> &Lua {
    &self.lua
  }

  /// Load an artifact file into this context.
  ///
  /// Relative paths are resolved against the context directory. The artifact must
  /// live inside that directory and evaluate to its export table.
  pub fn load(&self, artifact: &Path) -> Result<LoadedArtifact<'_>, LoadError> {
    let requested = if artifact.is_absolute() {
      artifact.to_path_buf()
    } else {
      self.directory.join(artifact)
    };

    if !requested.is_file() {
      return Err(LoadError::ArtifactNotFound { path: requested });
    }

    let load_failed = |message: String| LoadError::LoadFailed {
      path: requested.clone(),
      message,
    };

    // Containment is checked on the directory holding the artifact, so published
    // symlinks pointing back into the source tree still load.
    let (Some(parent), Some(file_name)) = (requested.parent(), requested.file_name()) else {
      return Err(load_failed("artifact path has no file name".to_string()));
    };
    let parent = dunce::canonicalize(parent).map_err(|e| load_failed(e.to_string()))?;
    if !parent.starts_with(&self.directory) {
      return Err(load_failed(format!(
        "artifact is outside the context directory {}",
        self.directory.display()
      )));
    }
    let path = parent.join(file_name);

    let exports = match runtime::load_file(&self.lua, &path).map_err(|e| load_failed(e.to_string()))? {
      LuaValue::Table(table) => table,
      other => {
        return Err(load_failed(format!(
          "artifact must return an export table, got {}",
          other.type_name()
        )));
      }
    };

    let name = requested
      .file_stem()
      .map(|stem| stem.to_string_lossy().to_string())
      .unwrap_or_default();

    debug!(context = %self.id, artifact = %name, path = %path.display(), "loaded artifact");

    Ok(LoadedArtifact {
      context: self,
      name,
      path,
      exports,
    })
  }
}

/// An artifact evaluated inside an [`IsolatedContext`].
pub struct LoadedArtifact<'ctx> {
  context: &'ctx IsolatedContext,
  name: String,
  path: PathBuf,
  exports: LuaTable,
}

impl fmt::Debug for LoadedArtifact<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoadedArtifact")
      .field("context", &self.context.id)
      .field("name", &self.name)
      .field("path", &self.path)
      .finish_non_exhaustive()
  }
}

impl<'ctx> LoadedArtifact<'ctx> {
  /// Artifact name: the file name without extension.
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn context(&self) -> &'ctx IsolatedContext {
    self.context
  }

  /// Fully qualified names of all exported types, sorted.
  pub fn type_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .exports
      .pairs::<LuaValue, LuaValue>()
      .filter_map(Result::ok)
      .filter_map(|(key, value)| match (key, value) {
        (LuaValue::String(name), LuaValue::Table(_)) => name.to_str().ok().map(|s| s.to_string()),
        _ => None,
      })
      .collect();
    names.sort();
    names
  }

  pub(crate) fn exports(&self) -> &LuaTable {
    &self.exports
  }
}

/// Creates the isolated context for each run.
pub trait ContextFactory: Send + Sync {
  fn create(&self, directory: &Path) -> Result<IsolatedContext, LoadError>;
}

/// Creates a plain [`IsolatedContext`] per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContextFactory;

impl ContextFactory for DefaultContextFactory {
  fn create(&self, directory: &Path) -> Result<IsolatedContext, LoadError> {
    IsolatedContext::new(directory)
  }
}
