//! Error types for the client.

use thiserror::Error;

/// Errors surfaced by client-side operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Keystore or conversation file problem.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The relay rejected the request; 4xx responses are terminal.
    #[error("Relay rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error body from the relay, if any.
        message: String,
    },

    /// The relay stayed unreachable or kept failing across every retry.
    #[error("Relay unreachable after {attempts} attempts: {last_error}")]
    Unreachable {
        /// How many attempts were made.
        attempts: u32,
        /// The final failure.
        last_error: String,
    },

    /// Protocol-level failure (validation, sealing, opening).
    #[error(transparent)]
    Protocol(#[from] obscura_protocol::ProtocolError),

    /// Cryptographic failure.
    #[error(transparent)]
    Crypto(#[from] obscura_crypto::CryptoError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
