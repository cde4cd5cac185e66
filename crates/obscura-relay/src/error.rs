//! Error types for the relay.

use thiserror::Error;

use obscura_protocol::ProtocolError;

/// Errors raised while serving relay requests.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A request field failed validation.
    #[error(transparent)]
    Validation(#[from] ProtocolError),

    /// The caller exceeded the configured rate limit.
    #[error("Too many requests")]
    RateLimited,

    /// The store refused the message because the global cap is reached.
    #[error("Relay storage is at capacity")]
    Overloaded,

    /// Anything unrecoverable. Details stay server-side.
    #[error("Internal error")]
    Internal,
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
