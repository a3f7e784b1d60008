//! Error types for the expression crate.

use thiserror::Error;

/// Errors that can occur when parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The expression text is not valid syntax.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    /// A name was looked up but is not bound in the scope.
    #[error("{0} is not defined")]
    Unresolved(String),

    /// An operation was applied to a value that does not support it.
    #[error("type error: {0}")]
    Type(String),

    /// The callee is neither a registered function nor an allowed method.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments.
    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: &'static str,
        actual: usize,
    },
}

impl ExprError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        ExprError::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        ExprError::Type(message.into())
    }
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, ExprError>;
