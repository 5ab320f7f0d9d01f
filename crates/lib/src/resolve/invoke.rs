use mlua::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::{EntryForm, ResolvedEntryPoint};

/// Result of calling an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
  /// The entry point returned an integer.
  Code(i32),
  /// The entry point returned nothing usable as an exit code.
  NoResult,
}

impl ExitStatus {
  /// Exit code of the run; no result maps to 0.
  pub fn code(self) -> i32 {
    match self {
      ExitStatus::Code(code) => code,
      ExitStatus::NoResult => 0,
    }
  }

  /// Translate the first value returned by the entry point.
  ///
  /// Integers, and floats with an exact integral value, that fit in an `i32`
  /// become the exit code. Anything else counts as no result.
  pub fn from_return(value: Option<&LuaValue>) -> Self {
    match value {
      None | Some(LuaValue::Nil) => ExitStatus::NoResult,
      Some(LuaValue::Integer(n)) => match i32::try_from(*n) {
        Ok(code) => ExitStatus::Code(code),
        Err(_) => {
          warn!(value = n, "entry point returned an integer outside the exit code range");
          ExitStatus::NoResult
        }
      },
      Some(LuaValue::Number(n)) if n.fract() == 0.0 && *n >= i32::MIN as f64 && *n <= i32::MAX as f64 => {
        ExitStatus::Code(*n as i32)
      }
      Some(other) => {
        warn!(kind = other.type_name(), "entry point returned a non-integer value");
        ExitStatus::NoResult
      }
    }
  }
}

/// The hosted code raised an error.
#[derive(Debug, Error)]
#[error("entry point {class_name}.{method_name} failed: {source}")]
pub struct InvokeError {
  pub class_name: String,
  pub method_name: String,
  #[source]
  pub source: LuaError,
}

impl ResolvedEntryPoint<'_> {
  /// Call the entry point with `args` as a Lua sequence of strings.
  ///
  /// Blocks until the hosted code returns. Errors raised by the constructor or the
  /// method are returned unchanged inside [`InvokeError`].
  pub fn invoke(&self, args: &[String]) -> Result<ExitStatus, InvokeError> {
    let returned = self.call(args).map_err(|source| InvokeError {
      class_name: self.class_name.clone(),
      method_name: self.method_name.clone(),
      source,
    })?;

    let status = ExitStatus::from_return(returned.iter().next());
    debug!(class = %self.class_name, method = %self.method_name, status = ?status, "entry point returned");

    Ok(status)
  }

  fn call(&self, args: &[String]) -> LuaResult<LuaMultiValue> {
    let lua = self.artifact.context().lua();
    let argv = lua.create_sequence_from(args.iter().map(String::as_str))?;

    match (self.form, &self.constructor) {
      (EntryForm::Instance, Some(constructor)) => {
        let instance: LuaValue = constructor.call(())?;
        if instance.is_nil() {
          return Err(LuaError::runtime(format!(
            "constructor of '{}' returned nil",
            self.class_name
          )));
        }
        self.method.call((instance, argv))
      }
      _ => self.method.call(argv),
    }
  }
}
