//! User-facing diagnostics.
//!
//! Every error shown to a user names the element it is about and, where
//! possible, what to change to get past it. Errors pointing into a source
//! file are miette reports instead.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Suggestions shared by several errors.
pub mod suggestions {
    pub const NO_CONFIG: &str = "run `shimsmith init` to create a Shimsmith.toml";

    pub const NO_INPUT: &str = "list headers under [module] or pass `--header`/`--declarations`";

    pub const UNRESOLVED_TYPE: &str =
        "use reference = \"include-missing\" or \"opaque-missing\" in [policy]";

    pub const GENERATION_FAILED: &str = "set error = \"log\" in [policy] to skip failing members";

    pub const COMPILE_FAILED: &str = "rerun with `--verbose` to see the compiler invocation";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, false) => "error",
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, false) => "warning",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
        }
    }
}

/// A message with the element it concerns and ways to fix it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// `= ...` lines under the message
    pub context: Vec<String>,
    /// Numbered `help` lines
    pub suggestions: Vec<String>,
    /// File the message is about
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for a terminal; `color` adds ANSI styling to the labels.
    pub fn format(&self, color: bool) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_to(&mut out, color);
        out
    }

    fn write_to(&self, out: &mut String, color: bool) -> fmt::Result {
        writeln!(out, "{}: {}", self.severity.label(color), self.message)?;
        if let Some(path) = &self.location {
            writeln!(out, "  --> {}", path.display())?;
        }
        for line in &self.context {
            writeln!(out, "  = {}", line)?;
        }
        if self.suggestions.is_empty() {
            return Ok(());
        }

        let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
        writeln!(out)?;
        if let [only] = self.suggestions.as_slice() {
            return writeln!(out, "{}: {}", help, only);
        }
        writeln!(out, "{}: consider:", help)?;
        for (i, suggestion) in self.suggestions.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, suggestion)?;
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// A type the resolver could not turn into a class, native or pointer.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("unresolved type `{ty}` in `{element}`")]
#[diagnostic(
    code(shimsmith::resolve::unresolved_type),
    help("Widen the class filter, or choose the include-missing or opaque-missing reference policy")
)]
pub struct UnresolvedTypeError {
    pub ty: String,
    pub element: String,
}

/// A configuration file that is not valid TOML for its schema.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid configuration: {message}")]
#[diagnostic(code(shimsmith::config::parse))]
pub struct ConfigParseError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
