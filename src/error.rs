//! Error types for resumable subscriptions.

use crate::types::StreamKey;
use thiserror::Error;

/// Main error type for subscription operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The consumer factory has no case for a stream key found in the
    /// vault. Indicates a vault/owner mismatch bug, not a recoverable
    /// condition.
    #[error("no consumer registered for stream key {0}")]
    UnknownStreamKey(StreamKey),

    #[error("external request was cancelled")]
    RequestCancelled,

    #[error("external request failed")]
    RequestFailed,
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, StreamError>;
