//! Test utilities for projrun-lib.
//!
//! Helpers to lay out throwaway projects and artifacts in temporary directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Artifact with `Foo.EntryPointStubClass`, whose `Main` returns `args[1]` as an integer.
pub const ENTRY_POINT_STUB: &str = r#"
local EntryPointStubClass = {}

function EntryPointStubClass.Main(args)
  return tonumber(args[1])
end

function EntryPointStubClass.Void(args)
end

function EntryPointStubClass.Fail(args)
  error("stub failure: " .. tostring(args[1]))
end

calls = (calls or 0) + 1
function EntryPointStubClass.Calls(args)
  return calls
end

return { ["Foo.EntryPointStubClass"] = EntryPointStubClass }
"#;

/// Descriptor that publishes `src/Foo.lua` through the shell.
#[cfg(unix)]
pub const STUB_DESCRIPTOR: &str = r#"
return {
  name = "Foo",
  targets = { "lua54", "luajit" },
  restore = "test -f src/Foo.lua",
  publish = "cp src/Foo.lua \"$out/Foo.lua\"",
}
"#;

/// A project in its own temporary directory.
pub struct TestProject {
  pub temp: TempDir,
  pub descriptor: PathBuf,
}

impl TestProject {
  /// Create a project whose descriptor `Foo.proj.lua` has `content`.
  pub fn new(content: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let descriptor = temp.path().join("Foo.proj.lua");
    std::fs::write(&descriptor, content).unwrap();
    Self { temp, descriptor }
  }

  /// The entry point stub project, built by [`STUB_DESCRIPTOR`].
  #[cfg(unix)]
  pub fn entry_point_stub() -> Self {
    let project = Self::new(STUB_DESCRIPTOR);
    project.write_file("src/Foo.lua", ENTRY_POINT_STUB);
    project
  }

  pub fn dir(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    write_file(&self.temp.path().join(relative_path), content);
  }
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}
