//! Error types for graph-export
//!
//! This module provides error handling for the library, including:
//! - Remote API errors with the remote-supplied type and message
//! - A distinct rate-limit error kind that drives the retry policy
//! - Transport, serialization, and I/O error conversions

use thiserror::Error;

/// Result type alias for graph-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for graph-export
///
/// Each variant carries enough context to decide whether a task should be
/// retried, abandoned, or abort the process.
#[derive(Debug, Error)]
pub enum Error {
    /// No access token configured — fails before any network activity
    #[error("no access token configured: set --token or GRAPH_ACCESS_TOKEN")]
    MissingToken,

    /// The remote API returned an error object or a non-success status
    #[error("remote error ({kind}): {message}")]
    Remote {
        /// Remote-supplied error type (or HTTP status when no error body)
        kind: String,
        /// Remote-supplied error message
        message: String,
    },

    /// A remote error whose message indicates request throttling
    ///
    /// Classified at the fetch client by a case-insensitive substring match
    /// on the word "limit" in the remote error message. The remote does not
    /// signal throttling through the transport status, so message content is
    /// the only available discriminator.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Remote-supplied error message that triggered the classification
        message: String,
    },

    /// A timestamp field failed to parse into the normalized format
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The row filter was asked for a column that is not in the schema
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A CSV record could not be parsed (unterminated quote, missing header)
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this failure is the transient throttling class that
    /// the retry policy backs off and retries indefinitely.
    ///
    /// Everything else is permanent from the pipeline's point of view: the
    /// task is logged and abandoned, and the identifier is never retried.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}
