//! # obscura-crypto
//!
//! Cryptographic primitives for the Obscura messenger:
//!
//! - **Key exchange**: X25519, with separate long-term identity keys and
//!   single-use ephemeral keys (one per outbound message)
//! - **Symmetric encryption**: XChaCha20-Poly1305 AEAD with detached
//!   192-bit nonces
//! - **Key derivation**: BLAKE3 derive_key over the Diffie-Hellman shared
//!   secret
//!
//! ## Security
//!
//! All secret material implements `Zeroize` for cleanup on drop, and no
//! secret type prints its bytes through `Debug`. Ephemeral secrets are
//! consumed by the exchange, so a per-message key cannot outlive its
//! message.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod symmetric;
pub mod x25519;

pub use error::{CryptoError, Result};
pub use symmetric::{decrypt, encrypt, EncryptedPayload, Nonce, SymmetricKey};
pub use x25519::{
    EphemeralKeyPair, IdentityKeyPair, PublicKey, SharedSecret, StaticPrivateKey,
};

#[cfg(test)]
mod proptests;
