//! Error types for aiswire.

use thiserror::Error;

/// Main error type for all aiswire operations.
///
/// Transient conditions (would-block, zero-byte reads) are deliberately
/// absent here: they are expected, frequent outcomes of non-blocking I/O
/// and are absorbed by the retry loops as
/// [`ReadOutcome`](crate::chunk::ReadOutcome) values, never surfaced as
/// errors.
#[derive(Debug, Error)]
pub enum AiswireError {
    /// The target host did not resolve to an IPv4 address.
    #[error("only IPv4 addresses are supported")]
    UnsupportedAddressFamily,

    /// Underlying primitive failure while establishing the connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// Cancellation was signaled while the connect was still polling.
    #[error("connection attempt was canceled")]
    ConnectCanceled,

    /// Cancellation was signaled while waiting for data.
    #[error("operation canceled")]
    Canceled,
}

/// Result type alias using AiswireError.
pub type Result<T> = std::result::Result<T, AiswireError>;
