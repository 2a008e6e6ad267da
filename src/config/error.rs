//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}' as a number")]
    InvalidNumber { name: &'static str, value: String },

    /// A boolean environment variable was not one of the accepted spellings.
    #[error("failed to parse {name}='{value}' as a boolean")]
    InvalidBool { name: &'static str, value: String },

    /// A rate or threshold is outside its valid range.
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },

    /// A count that must be positive was zero.
    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// The rules file could not be read.
    #[error("failed to read rules file {path}: {source}")]
    RulesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rules file is not a JSON list of rules.
    #[error("failed to parse rules file {path}: {source}")]
    RulesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
