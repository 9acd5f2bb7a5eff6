//! Error types for portfolio-core

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for configuration, preference and I/O operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Failure reported by a [`crate::transport::RepositoryTransport`] for a single call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and connectivity failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout(_) | TransportError::Io(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return TransportError::Timeout(e.to_string());
        }
        if e.is_connect() || e.is_request() || e.is_body() {
            return TransportError::Io(e.to_string());
        }
        match find_io_error(&e) {
            Some(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                TransportError::Timeout(e.to_string())
            }
            Some(_) => TransportError::Io(e.to_string()),
            None => TransportError::Other(e.to_string()),
        }
    }
}

/// First `std::io::Error` in the source chain, if any
fn find_io_error<'a>(e: &'a (dyn std::error::Error + 'static)) -> Option<&'a std::io::Error> {
    let mut current = e.source();
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        current = err.source();
    }
    None
}

/// Outcome of a fetch sequence that did not produce a repository list.
///
/// `Transient` classifies a single failed attempt; the retry loop consumes it
/// and it never ends a sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// A retryable failure of one attempt
    #[error("transient network error: {0}")]
    Transient(TransportError),

    /// A failure that aborts the sequence without retrying
    #[error("unexpected error: {0}")]
    Fatal(TransportError),

    #[error("gave up after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("fetch cancelled")]
    Cancelled,
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        if e.is_retryable() {
            FetchError::Transient(e)
        } else {
            FetchError::Fatal(e)
        }
    }
}
