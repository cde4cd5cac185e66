//! Error types for protocol operations.

use thiserror::Error;

/// Errors that can occur while building, validating, or opening envelopes.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A wire field failed validation.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// The offending request field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Authenticated decryption failed (wrong key or tampered ciphertext).
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Underlying cryptographic failure during sealing.
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] obscura_crypto::CryptoError),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
