//! Routing token derivation.
//!
//! A routing token is the relay's only index key: `SHA-256(recipient
//! public key bytes)`, rendered as 64 lowercase hex characters. The relay
//! never sees the public key itself, and the token reveals nothing about
//! content or sender. Equal tokens mean the same recipient; collisions are
//! cryptographically negligible.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use obscura_crypto::PublicKey;

use crate::error::{ProtocolError, Result};
use crate::limits::KEY_HEX_LEN;

/// Check that a string is exactly 64 lowercase hex characters.
///
/// This is the validation rule for every identity-shaped wire field
/// (`^[0-9a-f]{64}$`). Uppercase is rejected so each key and token has one
/// canonical spelling.
pub fn is_identity_hex(s: &str) -> bool {
    s.len() == KEY_HEX_LEN && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// A 256-bit routing token derived from a recipient's public key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RoutingToken([u8; 32]);

impl RoutingToken {
    /// Derive the token for a recipient public key.
    ///
    /// Pure function: equal keys always produce equal tokens.
    pub fn derive(recipient: &PublicKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(recipient.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Parse a token from its canonical 64-character lowercase hex form.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidField` for anything that is not
    /// exactly 64 lowercase hex characters.
    pub fn from_hex(s: &str) -> Result<Self> {
        if !is_identity_hex(s) {
            return Err(ProtocolError::InvalidField {
                field: "token",
                reason: "must be 64 lowercase hex characters".to_string(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| ProtocolError::InvalidField {
            field: "token",
            reason: e.to_string(),
        })?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Format as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The first 8 hex characters, for log lines.
    ///
    /// Full tokens must never be logged.
    pub fn prefix(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    /// Constant-time check that this token belongs to a public key.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        Self::derive(public_key).0.ct_eq(&self.0).into()
    }

    /// Get the raw token bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for RoutingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RoutingToken({}..)", self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscura_crypto::StaticPrivateKey;

    #[test]
    fn test_derive_deterministic() {
        let key = StaticPrivateKey::generate().public_key();

        assert_eq!(RoutingToken::derive(&key), RoutingToken::derive(&key));
    }

    #[test]
    fn test_different_keys_different_tokens() {
        let a = StaticPrivateKey::generate().public_key();
        let b = StaticPrivateKey::generate().public_key();

        assert_ne!(RoutingToken::derive(&a), RoutingToken::derive(&b));
    }

    #[test]
    fn test_hex_roundtrip() {
        let token = RoutingToken::derive(&StaticPrivateKey::generate().public_key());
        let hex = token.to_hex();

        assert_eq!(hex.len(), 64);
        assert_eq!(RoutingToken::from_hex(&hex).unwrap(), token);
    }

    #[test]
    fn test_from_hex_rejects_uppercase() {
        let hex = RoutingToken::derive(&StaticPrivateKey::generate().public_key()).to_hex();
        assert!(RoutingToken::from_hex(&hex.to_uppercase()).is_err());
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(RoutingToken::from_hex("abc123").is_err());
        assert!(RoutingToken::from_hex(&"a".repeat(63)).is_err());
        assert!(RoutingToken::from_hex(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_from_hex_rejects_non_hex() {
        assert!(RoutingToken::from_hex(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_verify() {
        let key = StaticPrivateKey::generate().public_key();
        let other = StaticPrivateKey::generate().public_key();
        let token = RoutingToken::derive(&key);

        assert!(token.verify(&key));
        assert!(!token.verify(&other));
    }

    #[test]
    fn test_debug_shows_prefix_only() {
        let token = RoutingToken::derive(&StaticPrivateKey::generate().public_key());
        let debug = format!("{:?}", token);

        assert!(debug.contains(&token.prefix()));
        assert!(!debug.contains(&token.to_hex()));
    }

    #[test]
    fn test_is_identity_hex() {
        assert!(is_identity_hex(&"0".repeat(64)));
        assert!(is_identity_hex(&"f".repeat(64)));
        assert!(!is_identity_hex(&"F".repeat(64)));
        assert!(!is_identity_hex(&"0".repeat(63)));
        assert!(!is_identity_hex(""));
    }
}
