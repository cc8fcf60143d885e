//! What happens when an element fails to generate.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::error;

use super::errors::GenerationError;

/// Where in the module a failure happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub module: String,
    pub class: Option<String>,
    pub member: Option<String>,
}

impl ErrorContext {
    pub fn module(name: &str) -> Self {
        ErrorContext {
            module: name.to_string(),
            ..Default::default()
        }
    }

    pub fn class(&self, spelling: &str) -> Self {
        ErrorContext {
            module: self.module.clone(),
            class: Some(spelling.to_string()),
            member: None,
        }
    }

    pub fn member(&self, name: &str) -> Self {
        ErrorContext {
            member: Some(name.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}", self.module)?;
        if let Some(class) = &self.class {
            write!(f, ", class {}", class)?;
        }
        if let Some(member) = &self.member {
            write!(f, ", member {}", member)?;
        }
        Ok(())
    }
}

/// Decides, per element, whether a generation error is fatal.
pub trait CodeGenerationPolicy: Send + Sync {
    /// Handle `error` raised at `ctx`. Returning `Err` aborts generation.
    fn on_error(&self, ctx: &ErrorContext, error: GenerationError) -> Result<(), GenerationError>;
}

/// Abort on the first error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowPolicy;

impl CodeGenerationPolicy for ThrowPolicy {
    fn on_error(&self, _ctx: &ErrorContext, error: GenerationError) -> Result<(), GenerationError> {
        Err(error)
    }
}

/// One element skipped under [`LogPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub context: ErrorContext,
    pub error: GenerationError,
}

/// Log the error, drop the element and continue with its siblings.
#[derive(Debug, Default)]
pub struct LogPolicy {
    failures: Mutex<Vec<GenerationFailure>>,
}

impl LogPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures recorded so far, in the order they were reported.
    pub fn failures(&self) -> Vec<GenerationFailure> {
        match self.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CodeGenerationPolicy for LogPolicy {
    fn on_error(&self, ctx: &ErrorContext, error: GenerationError) -> Result<(), GenerationError> {
        error!("{}: {}", ctx, error);
        let failure = GenerationFailure {
            context: ctx.clone(),
            error,
        };
        match self.failures.lock() {
            Ok(mut failures) => failures.push(failure),
            Err(poisoned) => poisoned.into_inner().push(failure),
        }
        Ok(())
    }
}

/// Error policy as selected in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    #[default]
    Throw,
    Log,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Throw => "throw",
            ErrorPolicy::Log => "log",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "throw" => Ok(ErrorPolicy::Throw),
            "log" => Ok(ErrorPolicy::Log),
            other => Err(format!(
                "unknown error policy `{}` (expected `throw` or `log`)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsupported() -> GenerationError {
        GenerationError::unsupported("array field", "A::values")
    }

    #[test]
    fn test_throw_policy_propagates() {
        let ctx = ErrorContext::module("m");
        assert_eq!(ThrowPolicy.on_error(&ctx, unsupported()), Err(unsupported()));
    }

    #[test]
    fn test_log_policy_records_context() {
        let policy = LogPolicy::new();
        let ctx = ErrorContext::module("m").class("A").member("values");

        assert!(policy.on_error(&ctx, unsupported()).is_ok());
        let failures = policy.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].context.to_string(), "module m, class A, member values");
    }

    #[test]
    fn test_error_policy_parse() {
        assert_eq!("LOG".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Log));
        assert_eq!("throw".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Throw));
        assert!("panic".parse::<ErrorPolicy>().is_err());
    }
}
