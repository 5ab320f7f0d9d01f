mod run;
mod targets;

pub use run::{FAILURE_EXIT_CODE, RunArgs, cmd_run};
pub use targets::cmd_targets;
