//! Runner configuration.
//!
//! Configuration is an explicit value handed to the [`Runner`](crate::runner::Runner)
//! and the [`ShellBuildOrchestrator`](crate::build::ShellBuildOrchestrator). It can be
//! built in code or read from the environment:
//!
//! - `PROJRUN_CONFIGURATION` - build configuration name (default `release`)
//! - `PROJRUN_SHELL` - shell used to run build steps (default: platform shell)
//! - `PROJRUN_BUILD_TIMEOUT` - maximum duration of a build step, e.g. `90s` or `5m`

use std::time::Duration;

use thiserror::Error;

use crate::consts::DEFAULT_CONFIGURATION;

pub const CONFIGURATION_ENV: &str = "PROJRUN_CONFIGURATION";
pub const SHELL_ENV: &str = "PROJRUN_SHELL";
pub const BUILD_TIMEOUT_ENV: &str = "PROJRUN_BUILD_TIMEOUT";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value '{value}' for {var}: {message}")]
  InvalidValue {
    var: &'static str,
    value: String,
    message: String,
  },
}

/// Settings shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
  /// Build configuration; part of the artifact location.
  pub configuration: String,
  /// Shell override for build steps.
  pub shell: Option<String>,
  /// Kill a build step that runs longer than this. `None` waits forever.
  pub build_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
  fn default() -> Self {
    Self {
      configuration: DEFAULT_CONFIGURATION.to_string(),
      shell: None,
      build_timeout: None,
    }
  }
}

impl RunnerConfig {
  /// Read configuration from `PROJRUN_*` environment variables.
  ///
  /// Unset or blank variables keep their defaults. A zero timeout disables the timeout.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(configuration) = non_empty_var(CONFIGURATION_ENV) {
      config.configuration = configuration;
    }

    config.shell = non_empty_var(SHELL_ENV);

    if let Some(raw) = non_empty_var(BUILD_TIMEOUT_ENV) {
      let timeout = parse_timeout(&raw).map_err(|message| ConfigError::InvalidValue {
        var: BUILD_TIMEOUT_ENV,
        value: raw.clone(),
        message,
      })?;
      config.build_timeout = timeout;
    }

    Ok(config)
  }

  pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
    self.configuration = configuration.into();
    self
  }

  pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
    self.shell = Some(shell.into());
    self
  }

  pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
    self.build_timeout = (!timeout.is_zero()).then_some(timeout);
    self
  }
}

/// Parse a human readable duration such as `30s` or `2m 30s`.
pub fn parse_timeout(raw: &str) -> Result<Option<Duration>, String> {
  let timeout = humantime::parse_duration(raw.trim()).map_err(|e| e.to_string())?;
  Ok((!timeout.is_zero()).then_some(timeout))
}

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
