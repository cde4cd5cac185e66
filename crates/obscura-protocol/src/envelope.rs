//! The on-wire message envelope.
//!
//! An envelope is everything the relay sees for one message:
//!
//! ```text
//! +-------------------+
//! | token             | 32 bytes - SHA-256 of recipient public key
//! +-------------------+
//! | sender_public_key | 32 bytes - single-use ephemeral X25519 key
//! +-------------------+
//! | nonce             | 24 bytes - XChaCha20 nonce
//! +-------------------+
//! | ciphertext        | variable - sealed inner payload
//! +-------------------+
//! | ttl               | advisory retention in seconds
//! +-------------------+
//! ```
//!
//! The relay cannot see: plaintext, the recipient's public key, or the true
//! sender (the `sender_public_key` field is ephemeral and the real sender
//! identity travels inside the ciphertext).

use obscura_crypto::{Nonce, PublicKey};

use crate::error::{ProtocolError, Result};
use crate::token::RoutingToken;

/// A validated message envelope.
///
/// Construct via [`crate::seal`] on the sending side, or via
/// [`crate::wire::SendRequest::validate`] when a relay accepts one off the
/// wire. Holding an `Envelope` means every field already passed shape
/// validation.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Routing token for the recipient's queue.
    pub token: RoutingToken,

    /// The sealed inner payload (includes the 16-byte authentication tag).
    pub ciphertext: Vec<u8>,

    /// Nonce the ciphertext was sealed under.
    pub nonce: Nonce,

    /// Ephemeral sender public key, fresh for this one message.
    pub sender_public_key: PublicKey,

    /// Advisory time-to-live in seconds; the relay clamps it on accept.
    pub ttl: u64,
}

impl Envelope {
    /// Validate envelope shape invariants.
    ///
    /// The typed fields already guarantee lengths; this checks what the
    /// types cannot: the ciphertext must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.ciphertext.is_empty() {
            return Err(ProtocolError::InvalidField {
                field: "ciphertext",
                reason: "must be non-empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscura_crypto::StaticPrivateKey;

    fn test_envelope() -> Envelope {
        let recipient = StaticPrivateKey::generate().public_key();
        Envelope {
            token: RoutingToken::derive(&recipient),
            ciphertext: vec![0xAB; 48],
            nonce: Nonce::generate(),
            sender_public_key: StaticPrivateKey::generate().public_key(),
            ttl: 3_600,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(test_envelope().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_ciphertext() {
        let mut envelope = test_envelope();
        envelope.ciphertext.clear();

        assert!(matches!(
            envelope.validate(),
            Err(ProtocolError::InvalidField {
                field: "ciphertext",
                ..
            })
        ));
    }
}
