//! Inner plaintext format.
//!
//! The sealed plaintext is `hex(sender_public_key) || "|" || message`.
//! Embedding the true sender key *inside* the ciphertext is what lets a
//! zero-knowledge relay still support multi-peer conversations: the relay
//! routes by recipient token only, and the recipient sorts a decrypted
//! message into the right conversation by reading this prefix.
//!
//! Parsing splits on the *first* `|` and requires the prefix to be exactly
//! 64 lowercase hex characters. Anything else degrades to an unknown
//! sender, with the entire inner plaintext preserved as the message - a
//! malformed prefix must never cost the user the message body.

use obscura_crypto::PublicKey;

use crate::limits::KEY_HEX_LEN;
use crate::token::is_identity_hex;

/// Separator between the sender prefix and the message body.
pub const SENDER_SEPARATOR: u8 = b'|';

/// The sender identity recovered from an inner payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sender {
    /// The prefix was a well-formed public key.
    Known(PublicKey),
    /// Missing separator or malformed prefix; message kept anyway.
    Unknown,
}

impl Sender {
    /// Hex form of the sender key, or `"unknown"`.
    pub fn label(&self) -> String {
        match self {
            Self::Known(key) => key.to_hex(),
            Self::Unknown => "unknown".to_string(),
        }
    }

    /// The sender key, if one was recovered.
    pub fn key(&self) -> Option<&PublicKey> {
        match self {
            Self::Known(key) => Some(key),
            Self::Unknown => None,
        }
    }
}

/// A parsed inner payload: who sent it, and what they said.
#[derive(Clone, Debug)]
pub struct InnerPayload {
    /// The recovered sender identity.
    pub sender: Sender,
    /// The message body. For a malformed prefix this is the *entire*
    /// inner plaintext, separator and all.
    pub message: Vec<u8>,
}

/// Encode an inner payload for sealing.
pub fn encode(sender: &PublicKey, message: &[u8]) -> Vec<u8> {
    let sender_hex = sender.to_hex();
    let mut inner = Vec::with_capacity(sender_hex.len() + 1 + message.len());
    inner.extend_from_slice(sender_hex.as_bytes());
    inner.push(SENDER_SEPARATOR);
    inner.extend_from_slice(message);
    inner
}

/// Parse a decrypted inner plaintext.
///
/// Never fails: a payload that does not match the format is returned whole
/// under [`Sender::Unknown`].
pub fn parse(inner: &[u8]) -> InnerPayload {
    let Some(sep) = inner.iter().position(|&b| b == SENDER_SEPARATOR) else {
        return InnerPayload {
            sender: Sender::Unknown,
            message: inner.to_vec(),
        };
    };

    if sep != KEY_HEX_LEN {
        return InnerPayload {
            sender: Sender::Unknown,
            message: inner.to_vec(),
        };
    }

    let prefix = &inner[..sep];
    let parsed = std::str::from_utf8(prefix)
        .ok()
        .filter(|s| is_identity_hex(s))
        .and_then(|s| PublicKey::from_hex(s).ok());

    match parsed {
        Some(key) => InnerPayload {
            sender: Sender::Known(key),
            message: inner[sep + 1..].to_vec(),
        },
        None => InnerPayload {
            sender: Sender::Unknown,
            message: inner.to_vec(),
        },
    }
}
