use std::path::Path;

use mlua::prelude::*;
use tracing::info;

use super::ContextId;
use crate::consts::HOST_GLOBAL;

#[cfg(windows)]
const NATIVE_MODULE_EXTENSION: &str = "dll";
#[cfg(not(windows))]
const NATIVE_MODULE_EXTENSION: &str = "so";

/// Create a fresh Lua VM scoped to `dir`.
///
/// `require` only searches `dir`, and safe mode still refuses C modules found
/// there. The `host` global exposes the directory, the context id and a `log`
/// function routed to `tracing`.
pub fn create_runtime(id: ContextId, dir: &Path) -> LuaResult<Lua> {
  let lua = Lua::new();

  let dir_str = dir.to_string_lossy().to_string();
  let package = lua.globals().get::<LuaTable>("package")?;
  package.set("path", format!("{0}/?.lua;{0}/?/init.lua", dir_str))?;
  package.set("cpath", format!("{}/?.{}", dir_str, NATIVE_MODULE_EXTENSION))?;

  let host = lua.create_table()?;
  host.set("dir", dir_str)?;
  host.set("context_id", id.as_u64())?;

  let log = lua.create_function(move |_, message: String| {
    info!(context = %id, "{}", message);
    Ok(())
  })?;
  host.set("log", log)?;

  lua.globals().set(HOST_GLOBAL, host)?;

  Ok(lua)
}

/// Evaluate the chunk at `path` and return its result.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let content = std::fs::read_to_string(path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path.display(), e)))?;

  lua
    .load(content.as_str())
    .set_name(format!("@{}", path.display()))
    .eval::<LuaValue>()
}
