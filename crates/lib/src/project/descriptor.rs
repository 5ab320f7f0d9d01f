use std::path::{Path, PathBuf};

use mlua::prelude::*;
use tracing::debug;

use super::ProjectError;

/// Contents of a project descriptor file.
///
/// ```lua
/// return {
///   name = "Foo",
///   targets = { "lua54", "luajit" },
///   restore = "./fetch-deps.sh",
///   publish = "cp src/*.lua \"$out\"",
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
  pub name: Option<String>,
  /// Ordered target variants. `target = "x"` is shorthand for `targets = { "x" }`.
  pub targets: Vec<String>,
  pub restore: Option<String>,
  pub publish: Option<String>,
}

/// Evaluate a descriptor file in a throwaway Lua VM.
///
/// The descriptor sees a `project` global with `dir`, `os` and `arch` so it can
/// pick variants per platform.
pub fn read_manifest(path: &Path) -> Result<ProjectManifest, ProjectError> {
  let invalid = |message: String| ProjectError::InvalidDescriptor {
    path: path.to_path_buf(),
    message,
  };

  let content = std::fs::read_to_string(path).map_err(|source| ProjectError::NotFound {
    path: path.to_path_buf(),
    source,
  })?;

  let lua = Lua::new();
  let value = eval_descriptor(&lua, path, &content).map_err(|e| invalid(e.to_string()))?;

  let table = match value {
    LuaValue::Table(table) => table,
    other => {
      return Err(invalid(format!(
        "descriptor must return a table, got {}",
        other.type_name()
      )));
    }
  };

  let manifest = parse_manifest(&table).map_err(|e| invalid(e.to_string()))?;
  debug!(path = %path.display(), targets = ?manifest.targets, "read project descriptor");

  Ok(manifest)
}

fn eval_descriptor(lua: &Lua, path: &Path, content: &str) -> LuaResult<LuaValue> {
  let project = lua.create_table()?;
  let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);
  project.set("dir", dir.to_string_lossy().to_string())?;
  project.set("os", std::env::consts::OS)?;
  project.set("arch", std::env::consts::ARCH)?;
  lua.globals().set("project", project)?;

  lua
    .load(content)
    .set_name(format!("@{}", path.display()))
    .eval::<LuaValue>()
}

fn parse_manifest(table: &LuaTable) -> LuaResult<ProjectManifest> {
  let name = optional_string(table, "name")?;
  let restore = optional_string(table, "restore")?;
  let publish = optional_string(table, "publish")?;

  let targets: Vec<String> = match table.get::<LuaValue>("targets")? {
    LuaValue::Nil => optional_string(table, "target")?.into_iter().collect(),
    LuaValue::Table(list) => list
      .sequence_values::<LuaValue>()
      .map(|value| match value? {
        LuaValue::String(target) => Ok(target.to_str()?.to_string()),
        other => Err(LuaError::external(format!(
          "targets must be a list of strings, found {}",
          other.type_name()
        ))),
      })
      .collect::<LuaResult<Vec<_>>>()?,
    other => {
      return Err(LuaError::external(format!(
        "targets must be a list, got {}",
        other.type_name()
      )));
    }
  };

  Ok(ProjectManifest {
    name,
    targets,
    restore,
    publish,
  })
}

/// Read a string field without Lua's number to string coercion.
fn optional_string(table: &LuaTable, field: &str) -> LuaResult<Option<String>> {
  match table.get::<LuaValue>(field)? {
    LuaValue::Nil => Ok(None),
    LuaValue::String(value) => Ok(Some(value.to_str()?.to_string())),
    other => Err(LuaError::external(format!(
      "{} must be a string, got {}",
      field,
      other.type_name()
    ))),
  }
}
