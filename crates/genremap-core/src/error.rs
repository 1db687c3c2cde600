use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for genremap.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The relationship extractor could not be set up.
    #[error("Extractor error: {0}")]
    ExtractorError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Reading or writing a document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The graph was requested before every stub produced a record.
    #[error("Genre graph incomplete: {missing} of {expected} records missing")]
    IncompleteGraph { missing: usize, expected: usize },

    /// The run was cancelled before all records were aggregated.
    #[error("Run cancelled after {completed} of {total} genres")]
    Cancelled { completed: usize, total: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = AppError::IncompleteGraph {
            missing: 3,
            expected: 10,
        };
        assert_eq!(
            err.to_string(),
            "Genre graph incomplete: 3 of 10 records missing"
        );
        assert_eq!(
            AppError::Timeout(Duration::from_millis(1500)).to_string(),
            "Request timed out after 1.5s"
        );
    }
}
