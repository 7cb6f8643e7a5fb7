//! Error types for tanzil2sql.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tanzil2sql operations.
#[derive(Debug, Error)]
pub enum TanzilError {
    /// The XML source is missing, unreadable or empty.
    #[error("Input error: {0}")]
    Input(String),

    /// The XML document is not well-formed.
    #[error("Parse error occurred when trying to parse XML file at position {position}: {message}")]
    Parse { position: u64, message: String },

    /// The document parsed, but the verse count is wrong.
    #[error("Total verse count is {actual}, not {expected}! Something went wrong...")]
    Validation { expected: usize, actual: usize },

    /// The generated SQL could not be written.
    #[error("Failed to save content to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session cannot perform the action in its current state.
    #[error("Cannot {action} while session is {state}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background conversion task died.
    #[error("Conversion task failed: {0}")]
    Task(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TanzilError {
    /// Create a parse error at the given byte offset.
    pub fn parse(position: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }
}

/// Result type alias for tanzil2sql operations.
pub type TanzilResult<T> = Result<T, TanzilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TanzilError::parse(17, "unclosed element <sura>");
        assert_eq!(
            err.to_string(),
            "Parse error occurred when trying to parse XML file at position 17: unclosed element <sura>"
        );
    }

    #[test]
    fn test_validation_display_reports_both_counts() {
        let err = TanzilError::Validation {
            expected: 6236,
            actual: 6235,
        };
        assert!(err.to_string().contains("6235, not 6236"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = TanzilError::InvalidState {
            state: "converting",
            action: "save",
        };
        assert_eq!(err.to_string(), "Cannot save while session is converting");
    }
}
