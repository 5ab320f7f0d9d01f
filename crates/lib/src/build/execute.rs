//! Shell build execution.
//!
//! [`ShellBuildOrchestrator`] reads the project descriptor and runs each declared
//! build step through the platform shell. Steps run with the project directory as
//! working directory and see the build parameters as environment variables:
//!
//! - `out` - the publish directory
//! - `PROJECT_DIR` / `PROJECT_FILE` - absolute project directory and descriptor
//! - `CONFIGURATION` / `TARGET` - build configuration and selected variant
//! - `BUILD_STEPS` - comma separated steps of this build

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use super::types::{BuildError, BuildFlags, BuildOrchestrator, BuildOutput, BuildStep};
use crate::config::RunnerConfig;
use crate::project::{ProjectError, ProjectManifest, publish_dir, read_manifest};

/// Runs descriptor-declared build steps as shell commands.
#[derive(Debug, Clone, Default)]
pub struct ShellBuildOrchestrator {
  shell: Option<String>,
  timeout: Option<Duration>,
}

impl ShellBuildOrchestrator {
  pub fn new(config: &RunnerConfig) -> Self {
    Self {
      shell: config.shell.clone(),
      timeout: config.build_timeout,
    }
  }
}

impl BuildOrchestrator for ShellBuildOrchestrator {
  fn target_variants(&self, project: &Path) -> Result<Vec<String>, BuildError> {
    Ok(read_manifest(project)?.targets)
  }

  fn build(&self, project: &Path, flags: &BuildFlags) -> Result<BuildOutput, BuildError> {
    let manifest = read_manifest(project)?;
    let project_dir = project.parent().ok_or_else(|| ProjectError::InvalidDescriptor {
      path: project.to_path_buf(),
      message: "descriptor path has no parent directory".to_string(),
    })?;

    let out_dir = publish_dir(project_dir, &flags.configuration, &flags.variant);
    std::fs::create_dir_all(&out_dir)?;

    info!(project = %project.display(), flags = %flags, "building project");

    let env = StepEnv {
      project_file: project.to_path_buf(),
      project_dir: project_dir.to_path_buf(),
      out_dir: out_dir.clone(),
      flags: flags.clone(),
    };

    // Child processes are driven on a private runtime so the timeout can kill them.
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()?;

    let mut result = BuildOutput {
      publish_dir: out_dir,
      ..Default::default()
    };

    for step in &flags.steps {
      let Some(cmd) = step_command(&manifest, *step) else {
        debug!(step = %step, "step not declared, skipping");
        continue;
      };

      let output = runtime.block_on(run_step(
        *step,
        cmd,
        &env,
        self.shell.as_deref(),
        self.timeout,
      ))?;

      result.steps_run.push(*step);
      result.output.push_str(&output);
    }

    Ok(result)
  }
}

fn step_command(manifest: &ProjectManifest, step: BuildStep) -> Option<&str> {
  match step {
    BuildStep::Restore => manifest.restore.as_deref(),
    BuildStep::Publish => manifest.publish.as_deref(),
  }
}

struct StepEnv {
  project_file: PathBuf,
  project_dir: PathBuf,
  out_dir: PathBuf,
  flags: BuildFlags,
}

/// Run a single build step and return its combined console output.
async fn run_step(
  step: BuildStep,
  cmd: &str,
  env: &StepEnv,
  shell: Option<&str>,
  timeout: Option<Duration>,
) -> Result<String, BuildError> {
  info!(step = %step, cmd = %cmd, "running build step");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(cmd)
    .current_dir(&env.project_dir)
    .env("out", &env.out_dir)
    .env("PROJECT_DIR", &env.project_dir)
    .env("PROJECT_FILE", &env.project_file)
    .env("CONFIGURATION", &env.flags.configuration)
    .env("TARGET", &env.flags.variant)
    .env("BUILD_STEPS", env.flags.steps_list())
    .stdin(Stdio::null())
    .kill_on_drop(true);

  debug!(shell = %shell_cmd, working_dir = ?env.project_dir, "spawning process");

  let child = command.output();
  let output = match timeout {
    Some(limit) => match tokio::time::timeout(limit, child).await {
      Ok(output) => output,
      Err(_) => return Err(BuildError::TimedOut { step, timeout: limit }),
    },
    None => child.await,
  }
  .map_err(|source| BuildError::Spawn { step, source })?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  let combined = combine_output(&stdout, &stderr);

  if !output.status.success() {
    return Err(BuildError::Failed {
      step,
      code: output.status.code(),
      output: combined,
    });
  }

  if !combined.is_empty() {
    debug!(step = %step, output = %combined, "build step output");
  }

  Ok(combined)
}

fn combine_output(stdout: &str, stderr: &str) -> String {
  match (stdout.trim(), stderr.trim()) {
    ("", "") => String::new(),
    (out, "") => out.to_string(),
    ("", err) => err.to_string(),
    (out, err) => format!("{}\n{}", out, err),
  }
}

/// Get the shell command and arguments for the current platform.
///
/// An explicit override picks its argument style from the shell name.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
