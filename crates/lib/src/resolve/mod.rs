//! Entry point resolution.
//!
//! Resolution is a two-stage lookup against a [`LoadedArtifact`]:
//!
//! 1. The type, by exact fully qualified name in the artifact's export table.
//! 2. The method, among the members declared directly on that type.
//!
//! A function stored on the type table itself is the *static* form and is
//! called as `Type.Method(args)`. Failing that, a function stored on the type's
//! `prototype` table is the *instance* form: the type's zero-argument `new`
//! constructor creates an instance and the method is called as
//! `method(instance, args)`. All lookups use raw access, so members inherited
//! through metatables never match.
//!
//! Misses are ordinary outcomes and come back as [`Resolution`] variants rather
//! than errors. The type is always looked up first, so a missing type is never
//! reported as a missing method.
//!
//! # Submodules
//!
//! - [`invoke`] - Calling a resolved entry point and translating its result

pub mod invoke;

use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONSTRUCTOR_FIELD, PROTOTYPE_FIELD};
use crate::loader::LoadedArtifact;

pub use invoke::{ExitStatus, InvokeError};

/// How a resolved method is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryForm {
  /// `Type.Method(args)`
  Static,
  /// `Type.prototype.Method(Type.new(), args)`
  Instance,
}

/// A callable entry point bound to the context it was resolved in.
pub struct ResolvedEntryPoint<'a> {
  artifact: &'a LoadedArtifact<'a>,
  class_name: String,
  method_name: String,
  form: EntryForm,
  method: LuaFunction,
  constructor: Option<LuaFunction>,
}

impl std::fmt::Debug for ResolvedEntryPoint<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResolvedEntryPoint")
      .field("artifact", &self.artifact.name())
      .field("class_name", &self.class_name)
      .field("method_name", &self.method_name)
      .field("form", &self.form)
      .finish_non_exhaustive()
  }
}

impl<'a> ResolvedEntryPoint<'a> {
  pub fn artifact(&self) -> &'a LoadedArtifact<'a> {
    self.artifact
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  pub fn method_name(&self) -> &str {
    &self.method_name
  }

  pub fn form(&self) -> EntryForm {
    self.form
  }
}

/// Outcome of [`resolve`].
#[derive(Debug)]
pub enum Resolution<'a> {
  Found(ResolvedEntryPoint<'a>),
  TypeNotFound {
    class_name: String,
    artifact_name: String,
  },
  MethodNotFound {
    class_name: String,
    artifact_name: String,
    method_name: String,
  },
}

impl<'a> Resolution<'a> {
  pub fn is_found(&self) -> bool {
    matches!(self, Resolution::Found(_))
  }

  /// Turn a miss into the matching [`ResolveError`].
  pub fn into_result(self) -> Result<ResolvedEntryPoint<'a>, ResolveError> {
    match self {
      Resolution::Found(entry) => Ok(entry),
      Resolution::TypeNotFound {
        class_name,
        artifact_name,
      } => Err(ResolveError::TypeNotFound {
        class_name,
        artifact_name,
      }),
      Resolution::MethodNotFound {
        class_name,
        artifact_name,
        method_name,
      } => Err(ResolveError::MethodNotFound {
        class_name,
        artifact_name,
        method_name,
      }),
    }
  }
}

/// An entry point that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("artifact '{artifact_name}' does not have class '{class_name}'")]
  TypeNotFound {
    class_name: String,
    artifact_name: String,
  },

  #[error("class '{class_name}' in artifact '{artifact_name}' does not have entry method '{method_name}'")]
  MethodNotFound {
    class_name: String,
    artifact_name: String,
    method_name: String,
  },
}

/// Resolve `class_name`/`method_name` inside `artifact`.
pub fn resolve<'a>(artifact: &'a LoadedArtifact<'a>, class_name: &str, method_name: &str) -> Resolution<'a> {
  let Some(LuaValue::Table(type_table)) = raw_member(artifact.exports(), class_name) else {
    debug!(
      artifact = %artifact.name(),
      class = %class_name,
      available = ?artifact.type_names(),
      "class not found"
    );
    return Resolution::TypeNotFound {
      class_name: class_name.to_string(),
      artifact_name: artifact.name().to_string(),
    };
  };

  let method_not_found = || Resolution::MethodNotFound {
    class_name: class_name.to_string(),
    artifact_name: artifact.name().to_string(),
    method_name: method_name.to_string(),
  };

  let (form, method, constructor) = if let Some(LuaValue::Function(method)) = raw_member(&type_table, method_name) {
    (EntryForm::Static, method, None)
  } else {
    let Some(LuaValue::Table(prototype)) = raw_member(&type_table, PROTOTYPE_FIELD) else {
      return method_not_found();
    };
    let Some(LuaValue::Function(method)) = raw_member(&prototype, method_name) else {
      return method_not_found();
    };
    let Some(LuaValue::Function(constructor)) = raw_member(&type_table, CONSTRUCTOR_FIELD) else {
      debug!(class = %class_name, method = %method_name, "instance method without a constructor");
      return method_not_found();
    };
    (EntryForm::Instance, method, Some(constructor))
  };

  debug!(
    context = %artifact.context().id(),
    artifact = %artifact.name(),
    class = %class_name,
    method = %method_name,
    form = ?form,
    "resolved entry point"
  );

  Resolution::Found(ResolvedEntryPoint {
    artifact,
    class_name: class_name.to_string(),
    method_name: method_name.to_string(),
    form,
    method,
    constructor,
  })
}

/// Raw lookup of a non-nil member; metatables are ignored.
fn raw_member(table: &LuaTable, name: &str) -> Option<LuaValue> {
  table.raw_get::<LuaValue>(name).ok().filter(|value| !value.is_nil())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::loader::IsolatedContext;
  use std::fs;
  use std::path::Path;
  use tempfile::TempDir;

  const ARTIFACT: &str = r#"
    local Static = {}
    function Static.Main(args) return 1 end
    function Static._hidden(args) return 2 end

    local Instance = { prototype = {} }
    function Instance.new() return setmetatable({}, { __index = Instance.prototype }) end
    function Instance.prototype:Main(args) return 3 end

    local NoCtor = { prototype = {} }
    function NoCtor.prototype:Main(args) return 4 end

    local Base = { Inherited = function() return 5 end }
    local Derived = setmetatable({}, { __index = Base })

    local exports = {
      ["Foo.Static"] = Static,
      ["Foo.Instance"] = Instance,
      ["Foo.NoCtor"] = NoCtor,
      ["Foo.Derived"] = Derived,
      ["Foo.NotAType"] = 42,
    }
    return setmetatable(exports, { __index = function() return Static end })
  "#;

  fn with_artifact(test: impl FnOnce(&LoadedArtifact<'_>)) {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Foo.lua"), ARTIFACT).unwrap();
    let context = IsolatedContext::new(temp_dir.path()).unwrap();
    let artifact = context.load(Path::new("Foo.lua")).unwrap();
    test(&artifact);
  }

  #[test]
  fn resolves_static_method() {
    with_artifact(|artifact| {
      let entry = resolve(artifact, "Foo.Static", "Main").into_result().unwrap();
      assert_eq!(entry.form(), EntryForm::Static);
      assert_eq!(entry.class_name(), "Foo.Static");
    });
  }

  #[test]
  fn resolves_non_public_style_method() {
    with_artifact(|artifact| {
      assert!(resolve(artifact, "Foo.Static", "_hidden").is_found());
    });
  }

  #[test]
  fn resolves_instance_method() {
    with_artifact(|artifact| {
      let entry = resolve(artifact, "Foo.Instance", "Main").into_result().unwrap();
      assert_eq!(entry.form(), EntryForm::Instance);
    });
  }

  #[test]
  fn instance_method_requires_constructor() {
    with_artifact(|artifact| {
      let err = resolve(artifact, "Foo.NoCtor", "Main").into_result().unwrap_err();
      assert!(matches!(err, ResolveError::MethodNotFound { .. }));
    });
  }

  #[test]
  fn inherited_members_are_ignored() {
    with_artifact(|artifact| {
      let err = resolve(artifact, "Foo.Derived", "Inherited").into_result().unwrap_err();
      assert_eq!(
        err,
        ResolveError::MethodNotFound {
          class_name: "Foo.Derived".to_string(),
          artifact_name: "Foo".to_string(),
          method_name: "Inherited".to_string(),
        }
      );
    });
  }

  #[test]
  fn missing_type_wins_over_missing_method() {
    with_artifact(|artifact| {
      let err = resolve(artifact, "Foo.Missing", "AlsoMissing").into_result().unwrap_err();
      assert_eq!(
        err,
        ResolveError::TypeNotFound {
          class_name: "Foo.Missing".to_string(),
          artifact_name: "Foo".to_string(),
        }
      );
    });
  }

  #[test]
  fn type_lookup_is_exact() {
    with_artifact(|artifact| {
      for name in ["foo.static", "Static", "Foo.Stat", "Foo.Static "] {
        assert!(
          matches!(resolve(artifact, name, "Main"), Resolution::TypeNotFound { .. }),
          "{} should not resolve",
          name
        );
      }
    });
  }

  #[test]
  fn non_table_export_is_not_a_type() {
    with_artifact(|artifact| {
      assert!(matches!(
        resolve(artifact, "Foo.NotAType", "Main"),
        Resolution::TypeNotFound { .. }
      ));
    });
  }

  #[test]
  fn method_lookup_is_case_sensitive() {
    with_artifact(|artifact| {
      assert!(matches!(
        resolve(artifact, "Foo.Static", "main"),
        Resolution::MethodNotFound { .. }
      ));
    });
  }

  #[test]
  fn error_messages_name_everything() {
    let err = ResolveError::MethodNotFound {
      class_name: "Foo.EntryPointStubClass".to_string(),
      artifact_name: "Foo".to_string(),
      method_name: "Run".to_string(),
    };
    assert_eq!(
      err.to_string(),
      "class 'Foo.EntryPointStubClass' in artifact 'Foo' does not have entry method 'Run'"
    );
  }
}
