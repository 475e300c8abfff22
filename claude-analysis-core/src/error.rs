//! Error types for claude-analysis-core

use thiserror::Error;

/// Main error type for the claude-analysis-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input could not be accessed or decoded (log file, stdin, hook payload)
    #[error("failed to read {source_name}: {message}")]
    Input {
        source_name: String,
        message: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Telemetry submission error
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Release registry error
    #[error("update check error: {0}")]
    Update(String),
}

impl Error {
    pub(crate) fn input(source_name: impl Into<String>, message: impl ToString) -> Self {
        Error::Input {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for claude-analysis-core
pub type Result<T> = std::result::Result<T, Error>;
