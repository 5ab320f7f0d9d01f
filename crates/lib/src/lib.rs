//! projrun-lib: build a project, load it in isolation and run its entry point.
//!
//! The pipeline runs a project like a subprocess without forking one:
//! - `build`: restore and publish the project through its declared shell steps
//! - `loader`: load the published artifact into a fresh, isolated Lua VM
//! - `resolve`: find the entry point type and method by name and invoke it
//! - `runner`: tie the stages together and map failures to error kinds
//!
//! ```no_run
//! use std::path::Path;
//!
//! use projrun_lib::config::RunnerConfig;
//! use projrun_lib::runner::{EntryPoint, Runner};
//!
//! let runner = Runner::from_config(RunnerConfig::default());
//! let entry = EntryPoint::new("Foo", "Foo.EntryPointStubClass").with_args(["10"]);
//! let exit_code = runner.run(Path::new("Foo/Foo.proj.lua"), &entry)?;
//! # Ok::<(), projrun_lib::runner::RunError>(())
//! ```

pub mod build;
pub mod config;
pub mod consts;
pub mod loader;
pub mod project;
pub mod resolve;
pub mod runner;

#[cfg(test)]
mod util;
