//! Error types for animatron-script

use thiserror::Error;

/// Configuration loading error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] animatron_core::Error),

    #[error("circular definitions: {chain}")]
    CircularDefinition { chain: String },

    #[error("circular inclusion is not allowed; started from {start} (step {step})")]
    CircularInclusion { start: String, step: String },

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("invalid section name '{0}', expected segment.mode")]
    InvalidSection(String),

    #[error("unknown mode {segment}.{mode} referenced by {line}")]
    UnknownMode {
        segment: String,
        mode: String,
        line: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
