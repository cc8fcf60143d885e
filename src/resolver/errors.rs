//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic, UnresolvedTypeError};

/// Error during type resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved type `{ty}` in `{element}`")]
    UnresolvedType { ty: String, element: String },

    #[error("declaration provider failed on `{spelling}`: {message}")]
    Provider { spelling: String, message: String },
}

impl ResolveError {
    pub(crate) fn provider(spelling: &str, err: anyhow::Error) -> Self {
        ResolveError::Provider {
            spelling: spelling.to_string(),
            message: format!("{:#}", err),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnresolvedType { ty, element } => {
                let mut diag = Diagnostic::error(format!("could not resolve type `{}`", ty));

                diag = diag.with_context(format!("referenced by `{}`", element));

                diag = diag
                    .with_suggestion(format!("Add `{}` to the class filter", ty))
                    .with_suggestion(suggestions::UNRESOLVED_TYPE.to_string());

                diag
            }

            ResolveError::Provider { spelling, message } => {
                Diagnostic::error(format!("declaration lookup failed for `{}`", spelling))
                    .with_context(message.clone())
                    .with_suggestion("Check the typedefs and declarations that name this type")
            }
        }
    }

    /// Rich report for an unresolved type, if this is one.
    pub fn to_report(&self) -> Option<UnresolvedTypeError> {
        match self {
            ResolveError::UnresolvedType { ty, element } => Some(UnresolvedTypeError {
                ty: ty.clone(),
                element: element.clone(),
            }),
            ResolveError::Provider { .. } => None,
        }
    }
}
