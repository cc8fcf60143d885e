//! Generation error types.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while emitting one element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The element has no representation in the target language.
    #[error("unsupported {what} in `{element}`")]
    Unsupported { what: String, element: String },

    #[error("{kind} in `{class}` has no name")]
    MissingName { kind: &'static str, class: String },

    #[error("class `{0}` has no size_of method")]
    MissingSizeOf(String),

    #[error("base class `{base}` of `{class}` is not part of the module")]
    UnknownBaseClass { class: String, base: String },
}

impl GenerationError {
    pub fn unsupported(what: impl Into<String>, element: impl Into<String>) -> Self {
        GenerationError::Unsupported {
            what: what.into(),
            element: element.into(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());
        match self {
            GenerationError::Unsupported { .. } => {
                diag = diag.with_suggestion("Remove the element with a [[mapping]] entry");
            }
            GenerationError::MissingSizeOf(_) => {
                diag = diag.with_context("a mapping pass may have removed it");
            }
            GenerationError::UnknownBaseClass { base, .. } => {
                diag = diag.with_suggestion(format!("Add `{}` to the class filter", base));
            }
            GenerationError::MissingName { .. } => {}
        }
        diag = diag.with_suggestion(suggestions::GENERATION_FAILED);
        diag
    }
}
