//! Error types shared across PHA crates.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Raw value found in the environment.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// An env file exists but could not be loaded.
    #[error("failed to load env file {}: {message}", path.display())]
    EnvFile {
        /// Path of the offending file.
        path: PathBuf,
        /// Loader message.
        message: String,
    },
}

/// Model output did not have the expected structured shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No JSON object could be located in the text.
    #[error("no JSON object found in model output")]
    NoJson,

    /// A JSON candidate was found but did not match the expected schema.
    #[error("invalid JSON: {0}")]
    Invalid(String),
}
