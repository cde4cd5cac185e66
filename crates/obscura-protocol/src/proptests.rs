//! Property-based tests for the protocol layer.

use proptest::prelude::*;

use obscura_crypto::IdentityKeyPair;

use crate::inner;
use crate::seal::{open, seal};
use crate::token::RoutingToken;
use crate::Sender;

proptest! {
    // Sealing is expensive per case; keep the case count moderate.
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// seal → open recovers the sender identity and the exact plaintext.
    #[test]
    fn seal_open_roundtrip(plaintext: Vec<u8>, ttl in 0u64..200_000) {
        let recipient = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let envelope = seal(&recipient.public_key(), &sender.public_key(), &plaintext, ttl).unwrap();
        let opened = open(recipient.private_key(), &envelope).unwrap();

        prop_assert_eq!(opened.sender, Sender::Known(sender.public_key()));
        prop_assert_eq!(opened.plaintext, plaintext);
    }

    /// The wrong private key never opens an envelope.
    #[test]
    fn wrong_recipient_fails(plaintext: Vec<u8>) {
        let recipient = IdentityKeyPair::generate();
        let other = IdentityKeyPair::generate();
        let sender = IdentityKeyPair::generate();

        let envelope = seal(&recipient.public_key(), &sender.public_key(), &plaintext, 60).unwrap();

        prop_assert!(open(other.private_key(), &envelope).is_err());
    }

    /// Inner parsing never loses message bytes, whatever the input.
    #[test]
    fn inner_parse_preserves_payload(payload: Vec<u8>) {
        let parsed = inner::parse(&payload);
        match parsed.sender {
            Sender::Known(key) => {
                // A recovered sender means the payload really had the
                // prefix shape; reassembling must give back the input.
                let mut reassembled = key.to_hex().into_bytes();
                reassembled.push(inner::SENDER_SEPARATOR);
                reassembled.extend_from_slice(&parsed.message);
                prop_assert_eq!(reassembled, payload);
            }
            Sender::Unknown => prop_assert_eq!(parsed.message, payload),
        }
    }

    /// Token hex parsing accepts exactly the canonical spelling.
    #[test]
    fn token_hex_strict(s in "[0-9a-fA-F]{0,80}") {
        let ok = RoutingToken::from_hex(&s).is_ok();
        let canonical = s.len() == 64 && s == s.to_lowercase();
        prop_assert_eq!(ok, canonical);
    }
}
