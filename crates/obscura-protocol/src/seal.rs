//! Sealing and opening message envelopes.
//!
//! The complete end-to-end encryption path:
//!
//! 1. Generate an ephemeral X25519 key pair for this one message
//! 2. ECDH with the recipient's long-term public key
//! 3. Derive the symmetric key from the shared secret (BLAKE3)
//! 4. Prefix the plaintext with the true sender's public key
//! 5. Encrypt under XChaCha20-Poly1305 with a random nonce
//! 6. Route by the token derived from the recipient key
//!
//! The ephemeral secret is consumed by the exchange and zeroized; only its
//! public half travels in the envelope, so the relay's view of the
//! "sender" is a key that was never used before and will never be used
//! again.

use obscura_crypto::{
    decrypt, encrypt, EphemeralKeyPair, PublicKey, StaticPrivateKey, SymmetricKey,
};

use crate::envelope::Envelope;
use crate::error::{ProtocolError, Result};
use crate::inner::{self, Sender};
use crate::token::RoutingToken;

/// Domain context for deriving the message key from the ECDH shared secret.
pub const MESSAGE_KEY_CONTEXT: &str = "obscura message key v1";

/// A successfully opened envelope.
#[derive(Clone, Debug)]
pub struct OpenedMessage {
    /// The true sender recovered from the inner payload, or
    /// [`Sender::Unknown`] if the prefix was malformed.
    pub sender: Sender,
    /// The message body.
    pub plaintext: Vec<u8>,
}

/// Seal `plaintext` for `recipient`, claiming `sender` as the true sender.
///
/// Generates fresh ephemeral key material, so two seals of identical
/// arguments never produce the same envelope.
///
/// # Errors
///
/// Returns `ProtocolError::Crypto` if encryption fails.
pub fn seal(
    recipient: &PublicKey,
    sender: &PublicKey,
    plaintext: &[u8],
    ttl: u64,
) -> Result<Envelope> {
    let ephemeral = EphemeralKeyPair::generate();
    let ephemeral_public = ephemeral.public_key().clone();

    let shared_secret = ephemeral.diffie_hellman(recipient);
    let key = SymmetricKey::from_bytes(&shared_secret.derive_key(MESSAGE_KEY_CONTEXT))?;

    let inner = inner::encode(sender, plaintext);
    let sealed = encrypt(&key, &inner)?;

    Ok(Envelope {
        token: RoutingToken::derive(recipient),
        ciphertext: sealed.ciphertext,
        nonce: sealed.nonce,
        sender_public_key: ephemeral_public,
        ttl,
    })
}

/// Open an envelope with the recipient's long-term private key.
///
/// # Errors
///
/// Returns `ProtocolError::DecryptionFailed` if authentication fails -
/// wrong recipient key, tampered ciphertext, or wrong nonce. No partial
/// plaintext is ever exposed.
///
/// A malformed inner payload is *not* an error: the message is returned
/// whole with [`Sender::Unknown`].
pub fn open(private_key: &StaticPrivateKey, envelope: &Envelope) -> Result<OpenedMessage> {
    let shared_secret = private_key.diffie_hellman(&envelope.sender_public_key);
    let key = SymmetricKey::from_bytes(&shared_secret.derive_key(MESSAGE_KEY_CONTEXT))?;

    let inner = decrypt(&key, &envelope.nonce, &envelope.ciphertext)
        .map_err(|_| ProtocolError::DecryptionFailed)?;

    let payload = inner::parse(&inner);
    Ok(OpenedMessage {
        sender: payload.sender,
        plaintext: payload.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscura_crypto::IdentityKeyPair;

    #[test]
    fn test_seal_open_roundtrip() {
        let recipient = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let envelope = seal(
            &recipient.public_key(),
            &sender.public_key(),
            b"hello",
            3_600,
        )
        .unwrap();

        let opened = open(recipient.private_key(), &envelope).unwrap();
        assert_eq!(opened.sender, Sender::Known(sender.public_key()));
        assert_eq!(opened.plaintext, b"hello");
    }

    #[test]
    fn test_token_matches_recipient() {
        let recipient = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let envelope = seal(&recipient.public_key(), &sender.public_key(), b"m", 60).unwrap();

        assert_eq!(envelope.token, RoutingToken::derive(&recipient.public_key()));
        assert!(envelope.token.verify(&recipient.public_key()));
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let recipient = IdentityKeyPair::generate();
        let eavesdropper = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let envelope = seal(&recipient.public_key(), &sender.public_key(), b"m", 60).unwrap();

        assert!(matches!(
            open(eavesdropper.private_key(), &envelope),
            Err(ProtocolError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_envelope_key_is_not_sender_key() {
        let recipient = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let envelope = seal(&recipient.public_key(), &sender.public_key(), b"m", 60).unwrap();

        // The relay-visible sender key is ephemeral, never the real one.
        assert_ne!(envelope.sender_public_key, sender.public_key());
    }

    #[test]
    fn test_ephemeral_distinctness() {
        // Repeated seals of the same arguments share nothing observable.
        let recipient = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let mut seen_keys = std::collections::HashSet::new();
        let mut seen_ciphertexts = std::collections::HashSet::new();

        for _ in 0..1_000 {
            let envelope =
                seal(&recipient.public_key(), &sender.public_key(), b"same", 60).unwrap();
            seen_keys.insert(envelope.sender_public_key.to_bytes());
            seen_ciphertexts.insert(envelope.ciphertext);
        }

        assert_eq!(seen_keys.len(), 1_000);
        assert_eq!(seen_ciphertexts.len(), 1_000);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let recipient = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let mut envelope = seal(&recipient.public_key(), &sender.public_key(), b"m", 60).unwrap();
        envelope.ciphertext[0] ^= 0xFF;

        assert!(matches!(
            open(recipient.private_key(), &envelope),
            Err(ProtocolError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_malformed_inner_still_delivered() {
        // Seal a payload that bypasses the inner format entirely, the way
        // a crafted sender could.
        let recipient = IdentityKeyPair::generate();

        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key().clone();
        let shared = ephemeral.diffie_hellman(&recipient.public_key());
        let key = SymmetricKey::from_bytes(&shared.derive_key(MESSAGE_KEY_CONTEXT)).unwrap();
        let sealed = encrypt(&key, b"not-hex|payload").unwrap();

        let envelope = Envelope {
            token: RoutingToken::derive(&recipient.public_key()),
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            sender_public_key: ephemeral_public,
            ttl: 60,
        };

        let opened = open(recipient.private_key(), &envelope).unwrap();
        assert_eq!(opened.sender, Sender::Unknown);
        assert_eq!(opened.plaintext, b"not-hex|payload");
    }
}
