//! XChaCha20-Poly1305 symmetric encryption.
//!
//! AEAD with 256-bit keys and 192-bit nonces. The nonce travels detached:
//! the relay wire format carries it as its own envelope field rather than
//! prefixed to the ciphertext.
//!
//! ## Security Notes
//!
//! - Keys are zeroized on drop
//! - Nonces are randomly generated using OsRng; 192 bits makes random
//!   generation collision-safe
//! - NEVER reuse a nonce with the same key

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (192 bits for XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key for XChaCha20-Poly1305.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generate a new random symmetric key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte slice.
    ///
    /// # Security
    ///
    /// Be careful with this - avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// A 192-bit nonce for XChaCha20-Poly1305.
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 24 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Parse from a 48-character hex string (wire format).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Format as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Get the nonce as a byte slice.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

/// Ciphertext plus the nonce that produced it.
#[derive(Clone, Debug)]
pub struct EncryptedPayload {
    /// The nonce used for encryption.
    pub nonce: Nonce,
    /// The ciphertext with authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypt plaintext under a fresh random nonce.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the cipher rejects the input.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<EncryptedPayload> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();
    let xnonce = XNonce::from_slice(nonce.as_bytes());

    let ciphertext = cipher
        .encrypt(xnonce, plaintext)
        .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))?;

    Ok(EncryptedPayload { nonce, ciphertext })
}

/// Decrypt ciphertext with a detached nonce.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if:
/// - The ciphertext has been tampered with
/// - The wrong key is used
/// - The ciphertext format is invalid
pub fn decrypt(key: &SymmetricKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let xnonce = XNonce::from_slice(nonce.as_bytes());

    cipher
        .decrypt(xnonce, ciphertext)
        .map_err(|_| CryptoError::Decryption)
}
