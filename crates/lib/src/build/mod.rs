//! Build orchestration.
//!
//! A build turns a project descriptor into published artifacts by running the
//! external build steps the descriptor declares. Builds are never cached: every
//! run restores and publishes again.
//!
//! # Submodules
//!
//! - [`execute`] - Shell based [`BuildOrchestrator`] implementation

pub mod execute;
mod types;

pub use execute::ShellBuildOrchestrator;
pub use types::*;
