use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wikigraph
#[derive(Error, Debug)]
pub enum WikigraphError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failures (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A line of an entity, triplet or value file does not have the expected shape
    #[error("Malformed input at {}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The SPARQL endpoint answered 429 Too Many Requests
    #[error("Service overloaded: too many requests")]
    Throttled,

    /// Any other non-success answer from the SPARQL endpoint
    #[error("Service error {status}: {body}")]
    Service { status: u16, body: String },

    /// heads and tails handed to a relation lookup differ in length
    #[error("Batch length mismatch: {heads} heads, {tails} tails")]
    BatchLengthMismatch { heads: usize, tails: usize },

    /// A lookup returned a different number of results than pairs asked for
    #[error("Response length mismatch: expected {expected}, got {actual}")]
    ResponseLengthMismatch { expected: usize, actual: usize },

    /// A bounded retry policy ran out of attempts while throttled
    #[error("Gave up after {attempts} throttled attempts")]
    RetriesExhausted { attempts: u32 },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WikigraphError {
    /// Whether the error is the recoverable overload signal.
    pub fn is_throttled(&self) -> bool {
        matches!(self, WikigraphError::Throttled)
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        WikigraphError::Malformed {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Convenient Result type using WikigraphError
pub type Result<T> = std::result::Result<T, WikigraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WikigraphError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_malformed_display_has_location() {
        let err = WikigraphError::malformed("graph.txt", 7, "expected 3 fields, found 2");
        let msg = err.to_string();
        assert!(msg.contains("graph.txt:7"));
        assert!(msg.contains("expected 3 fields"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WikigraphError = io_err.into();
        assert!(matches!(err, WikigraphError::Io(_)));
    }

    #[test]
    fn test_only_throttled_is_recoverable() {
        assert!(WikigraphError::Throttled.is_throttled());
        assert!(!WikigraphError::Service { status: 500, body: String::new() }.is_throttled());
        assert!(!WikigraphError::BatchLengthMismatch { heads: 1, tails: 2 }.is_throttled());
    }
}
