//! X25519 Diffie-Hellman key exchange.
//!
//! Two key flavours back the messenger: a long-term identity key pair kept
//! on disk for the lifetime of an identity, and a single-use ephemeral pair
//! generated for every outbound message. Both sides of a conversation reach
//! the same symmetric key by mixing one static half with one ephemeral half.
//!
//! ## Security Notes
//!
//! - Private keys are zeroized on drop
//! - Ephemeral secrets are consumed by the exchange and cannot be reused
//! - Shared secrets are never used as encryption keys directly; derive one
//!   with [`SharedSecret::derive_key`] first

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey as DalekPublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of an X25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an X25519 private key in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of the raw Diffie-Hellman shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// An X25519 public key.
///
/// Used both for long-term identities (the recipient key a sender encrypts
/// to) and for the ephemeral halves that travel in envelopes.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Create from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; PUBLIC_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Parse from a 64-character lowercase hex string.
    ///
    /// This is the canonical identity representation on the wire and in
    /// key files.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Format as a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Get the key as bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// Convert to an owned byte array.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

impl From<DalekPublicKey> for PublicKey {
    fn from(key: DalekPublicKey) -> Self {
        Self {
            bytes: key.to_bytes(),
        }
    }
}

impl From<&PublicKey> for DalekPublicKey {
    fn from(key: &PublicKey) -> Self {
        DalekPublicKey::from(key.bytes)
    }
}

/// A long-term X25519 private key.
///
/// This is the identity secret that persists on disk. It can perform any
/// number of Diffie-Hellman exchanges.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StaticPrivateKey {
    bytes: [u8; PRIVATE_KEY_SIZE],
}

impl StaticPrivateKey {
    /// Generate a new random private key.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self {
            bytes: secret.to_bytes(),
        }
    }

    /// Create from raw bytes.
    ///
    /// # Security
    ///
    /// Only use bytes from a secure source.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; PRIVATE_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Parse from a 64-character hex string (key-file format).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Format as a 64-character lowercase hex string.
    ///
    /// # Security
    ///
    /// Handle with care - this exposes the private key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(self.bytes);
        PublicKey::from(DalekPublicKey::from(&secret))
    }

    /// Perform Diffie-Hellman key exchange with a peer public key.
    pub fn diffie_hellman(&self, peer_public: &PublicKey) -> SharedSecret {
        let secret = StaticSecret::from(self.bytes);
        let shared = secret.diffie_hellman(&peer_public.into());
        SharedSecret {
            bytes: shared.to_bytes(),
        }
    }
}

impl std::fmt::Debug for StaticPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StaticPrivateKey([REDACTED])")
    }
}

// Clone intentionally NOT implemented for StaticPrivateKey: secret material
// must not be silently duplicated in memory.

/// A long-term identity key pair.
///
/// Thin wrapper owning the private half; the public half is derived on
/// demand so there is exactly one copy of the secret.
pub struct IdentityKeyPair {
    private: StaticPrivateKey,
}

impl IdentityKeyPair {
    /// Generate a fresh identity.
    pub fn generate() -> Self {
        Self {
            private: StaticPrivateKey::generate(),
        }
    }

    /// Reconstruct an identity from a stored private key.
    pub fn from_private(private: StaticPrivateKey) -> Self {
        Self { private }
    }

    /// The private half.
    pub fn private_key(&self) -> &StaticPrivateKey {
        &self.private
    }

    /// The public half, freshly derived.
    pub fn public_key(&self) -> PublicKey {
        self.private.public_key()
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKeyPair {{ public: {:?} }}", self.public_key())
    }
}

/// A single-use X25519 key pair for one outbound message.
///
/// The private half can only be spent once: [`Self::diffie_hellman`] takes
/// the pair by value and the secret is zeroized when the exchange drops it.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new ephemeral key pair.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(DalekPublicKey::from(&secret));
        Self { secret, public }
    }

    /// Get the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Perform Diffie-Hellman and consume the ephemeral key.
    ///
    /// The private key is destroyed after this operation.
    pub fn diffie_hellman(self, peer_public: &PublicKey) -> SharedSecret {
        let shared = self.secret.diffie_hellman(&peer_public.into());
        SharedSecret {
            bytes: shared.to_bytes(),
        }
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EphemeralKeyPair {{ public: {:?} }}", self.public)
    }
}

/// Shared secret derived from Diffie-Hellman key exchange.
///
/// This should be used as input to a KDF, not directly as an encryption key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; SHARED_SECRET_SIZE],
}

impl SharedSecret {
    /// Get the shared secret as bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.bytes
    }

    /// Derive an encryption key using BLAKE3 key derivation.
    ///
    /// The context string binds the derived key to a single use so the same
    /// exchange can never feed two different cipher roles.
    pub fn derive_key(&self, context: &str) -> [u8; 32] {
        blake3::derive_key(context, &self.bytes)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}
