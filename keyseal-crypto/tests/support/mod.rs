//! Shared helpers for keyseal integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use keyseal_crypto::{AsymmetricKey, CryptoConfig, RsaKeyPair, generate_keypair};

/// Key generation dominates test time, so each test binary reuses a handful
/// of 1024-bit pairs.
pub const TEST_KEY_BITS: usize = 1024;

fn cached(slot: &'static OnceLock<RsaKeyPair>) -> &'static RsaKeyPair {
    slot.get_or_init(|| {
        generate_keypair(&CryptoConfig::default(), TEST_KEY_BITS, 65537).unwrap()
    })
}

/// Recipient key pair (the encryption half).
pub fn recipient() -> &'static RsaKeyPair {
    static SLOT: OnceLock<RsaKeyPair> = OnceLock::new();
    cached(&SLOT)
}

/// Sender key pair (the signing half).
pub fn sender() -> &'static RsaKeyPair {
    static SLOT: OnceLock<RsaKeyPair> = OnceLock::new();
    cached(&SLOT)
}

/// An unrelated key pair for wrong-key tests.
pub fn stranger() -> &'static RsaKeyPair {
    static SLOT: OnceLock<RsaKeyPair> = OnceLock::new();
    cached(&SLOT)
}

pub fn public(pair: &RsaKeyPair) -> AsymmetricKey {
    AsymmetricKey::from(pair.public_key().clone())
}

pub fn private(pair: &RsaKeyPair) -> AsymmetricKey {
    AsymmetricKey::from(pair.private_key().clone())
}
