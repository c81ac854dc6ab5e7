// SPDX-License-Identifier: MIT

//! Typed error handling for pipekit-rs
//!
//! Library code returns these enums; the binary wraps them in `anyhow`.

use thiserror::Error;

use crate::ci::status::machine::Event;
use crate::ci::status::StatusKind;

/// Top-level error type for pipekit-rs
#[derive(Debug, Error)]
pub enum PipekitError {
    /// Expression lexing, parsing or evaluation errors
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Configuration errors (invalid keys, invalid `when`, bad policies)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Illegal status transitions
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid `exists:` globs
    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Errors raised while turning an expression string into a tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    /// The expression contained nothing to evaluate
    #[error("Unknown pipeline expression: empty statement")]
    Empty,

    /// Input that is not a known lexeme
    #[error("Invalid token `{fragment}` at position {position}")]
    InvalidToken { position: usize, fragment: String },

    /// Token limit exceeded
    #[error("Too many tokens, maximum is {limit}")]
    TooManyTokens { limit: usize },

    /// An opening or closing parenthesis without its counterpart
    #[error("Unbalanced parenthesis")]
    UnbalancedParenthesis,

    /// An operator without enough operands, or operands without an operator
    #[error("Expression incomplete: {0}")]
    Incomplete(String),

    /// A `/pattern/` literal that does not compile
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A status event fired from a status that does not accept it
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Cannot {event} from status `{from}`")]
pub struct TransitionError {
    pub event: Event,
    pub from: StatusKind,
}

impl PipekitError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for PipekitError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for PipekitError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

pub type Result<T> = std::result::Result<T, PipekitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_error_wraps_into_top_level() {
        let err: PipekitError = ExpressionError::UnbalancedParenthesis.into();
        assert_eq!(
            err.to_string(),
            "Expression error: Unbalanced parenthesis"
        );
    }

    #[test]
    fn test_transition_error_message() {
        let err = TransitionError {
            event: Event::Run,
            from: StatusKind::Success,
        };
        assert_eq!(err.to_string(), "Cannot run from status `success`");
    }

    #[test]
    fn test_config_helper() {
        let err = PipekitError::config("delayed job needs start_in");
        assert_eq!(
            err.to_string(),
            "Configuration error: delayed job needs start_in"
        );
    }
}
