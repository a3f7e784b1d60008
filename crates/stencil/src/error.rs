//! Error types for template compilation and rendering.
//!
//! This module provides [`TemplateError`], the error type returned by every
//! public operation of this crate. Expression failures keep the underlying
//! [`ExprError`] as their source.

use stencil_expr::ExprError;
use thiserror::Error;

/// Error type for template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An expression referenced a name the data context does not provide.
    ///
    /// Only raised by one-shot formatting; reusable templates bind every
    /// referenced name up front.
    #[error("unresolved binding: {name} is not defined")]
    UnresolvedBinding { name: String },

    /// An expression failed to parse or evaluate.
    #[error("error in expression `{expression}`: {source}")]
    Evaluation {
        expression: String,
        #[source]
        source: ExprError,
    },

    /// The data context is not usable as a set of bindings.
    #[error("context error: {0}")]
    Context(String),

    /// The data context could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TemplateError {
    /// Wraps an expression error, lifting unresolved names into
    /// [`TemplateError::UnresolvedBinding`].
    pub(crate) fn from_expr(expression: &str, err: ExprError) -> Self {
        match err {
            ExprError::Unresolved(name) => TemplateError::UnresolvedBinding { name },
            source => TemplateError::Evaluation {
                expression: expression.to_string(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_unresolved_name_becomes_binding_error() {
        let err = TemplateError::from_expr("name", ExprError::Unresolved("name".into()));
        assert!(matches!(err, TemplateError::UnresolvedBinding { ref name } if name == "name"));
        assert!(err.to_string().contains("name is not defined"));
    }

    #[test]
    fn test_other_errors_keep_source() {
        let err = TemplateError::from_expr("launch()", ExprError::UnknownFunction("launch".into()));
        assert!(err.to_string().contains("launch()"));
        let source = err.source().expect("evaluation errors carry a source");
        assert!(source.to_string().contains("unknown function"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TemplateError = json_err.into();
        assert!(matches!(err, TemplateError::Serialization(_)));
    }
}
