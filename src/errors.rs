// ABOUTME: Error types for the beamer-reveal converter
// ABOUTME: Only tree-building, chart-map loading and I/O can fail; conversion itself is total

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeamerError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("LaTeX parse error at byte {offset}: {message}")]
    ParseError { message: String, offset: usize },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("No input files found matching pattern: {0}")]
    NoInputsFoundError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl BeamerError {
    pub(crate) fn parse(message: impl Into<String>, offset: usize) -> Self {
        BeamerError::ParseError {
            message: message.into(),
            offset,
        }
    }
}

// Implement conversion from anyhow::Error to our BeamerError
impl From<anyhow::Error> for BeamerError {
    fn from(err: anyhow::Error) -> Self {
        BeamerError::UnknownError(err.to_string())
    }
}

impl From<glob::PatternError> for BeamerError {
    fn from(err: glob::PatternError) -> Self {
        BeamerError::InvalidPattern(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BeamerError>;
