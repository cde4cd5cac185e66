//! Property-based tests for cryptographic primitives.
//!
//! These verify that the core properties hold for arbitrary inputs:
//! roundtrips, uniqueness of generated material, and rejection of
//! malformed encodings.

use proptest::prelude::*;

use crate::{
    decrypt, encrypt, EphemeralKeyPair, Nonce, PublicKey, StaticPrivateKey, SymmetricKey,
};

proptest! {
    /// Encryption followed by decryption returns the original plaintext.
    #[test]
    fn encrypt_decrypt_roundtrip(plaintext: Vec<u8>) {
        let key = SymmetricKey::generate();
        let sealed = encrypt(&key, &plaintext).unwrap();
        let opened = decrypt(&key, &sealed.nonce, &sealed.ciphertext).unwrap();
        prop_assert_eq!(plaintext, opened);
    }

    /// A different key never opens the box.
    #[test]
    fn wrong_key_always_fails(plaintext: Vec<u8>) {
        let key = SymmetricKey::generate();
        let other = SymmetricKey::generate();
        let sealed = encrypt(&key, &plaintext).unwrap();
        prop_assert!(decrypt(&other, &sealed.nonce, &sealed.ciphertext).is_err());
    }

    /// Flipping any single ciphertext byte breaks authentication.
    #[test]
    fn tampered_byte_always_fails(plaintext in proptest::collection::vec(any::<u8>(), 1..256), flip in any::<prop::sample::Index>()) {
        let key = SymmetricKey::generate();
        let mut sealed = encrypt(&key, &plaintext).unwrap();
        let idx = flip.index(sealed.ciphertext.len());
        sealed.ciphertext[idx] ^= 0x01;
        prop_assert!(decrypt(&key, &sealed.nonce, &sealed.ciphertext).is_err());
    }

    /// Ephemeral-vs-static exchange agrees from both sides.
    #[test]
    fn exchange_agrees(_seed in any::<u64>()) {
        let recipient = StaticPrivateKey::generate();
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key().clone();

        let a = ephemeral.diffie_hellman(&recipient.public_key());
        let b = recipient.diffie_hellman(&ephemeral_public);

        prop_assert_eq!(a.as_bytes(), b.as_bytes());
    }

    /// Public key hex parsing only accepts exactly 64 hex chars.
    #[test]
    fn public_key_hex_strict(s in "[0-9a-f]{0,100}") {
        let parsed = PublicKey::from_hex(&s);
        prop_assert_eq!(parsed.is_ok(), s.len() == 64);
    }

    /// Nonce hex parsing only accepts exactly 48 hex chars.
    #[test]
    fn nonce_hex_strict(s in "[0-9a-f]{0,100}") {
        let parsed = Nonce::from_hex(&s);
        prop_assert_eq!(parsed.is_ok(), s.len() == 48);
    }
}
