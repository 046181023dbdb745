//! Error types for animatron-core

use thiserror::Error;

/// Core error type
///
/// Every variant is a configuration problem detected while building steps,
/// modes or triggers. Nothing in the runtime tick produces an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid {kind} '{value}' in {context}")]
    InvalidValue {
        kind: &'static str,
        value: String,
        context: String,
    },

    #[error("invalid number '{value}' in {line}")]
    InvalidNumber { value: String, line: String },

    #[error("step requires {expected} arguments, received {received} in {line}")]
    FieldCount {
        expected: usize,
        received: usize,
        line: String,
    },

    #[error("no previous value to fill in to {line}")]
    MissingInheritedValue { line: String },

    #[error("unknown trigger: {0}")]
    UnknownTrigger(String),

    #[error("mode {0} has no steps")]
    EmptyMode(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
