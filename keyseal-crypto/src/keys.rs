//! RSA key pairs and key capability checks.
//!
//! Signing only ever takes an [`RsaPrivateKey`] and verification an
//! [`RsaPublicKey`], so handing the wrong half to those operations is a
//! compile error. [`AsymmetricKey`] covers the envelope's encrypt/decrypt
//! slots, which legitimately accept either half.

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};

/// An RSA private key together with its public half.
#[derive(Clone)]
pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl RsaKeyPair {
    /// Wraps an existing private key, deriving the public half.
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.n().bits()
    }

    pub fn into_parts(self) -> (RsaPrivateKey, RsaPublicKey) {
        (self.private, self.public)
    }
}

/// Either half of an RSA key pair.
#[derive(Clone)]
pub enum AsymmetricKey {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

impl AsymmetricKey {
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private(_))
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        match self {
            Self::Private(key) => key.n().bits(),
            Self::Public(key) => key.n().bits(),
        }
    }

    /// The public half of this key.
    pub fn to_public_key(&self) -> RsaPublicKey {
        match self {
            Self::Private(key) => key.to_public_key(),
            Self::Public(key) => key.clone(),
        }
    }
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsaKeyPair({} bits, [REDACTED])", self.bits())
    }
}

impl std::fmt::Debug for AsymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private(_) => write!(f, "AsymmetricKey::Private({} bits)", self.bits()),
            Self::Public(_) => write!(f, "AsymmetricKey::Public({} bits)", self.bits()),
        }
    }
}

impl From<RsaPrivateKey> for AsymmetricKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self::Private(key)
    }
}

impl From<RsaPublicKey> for AsymmetricKey {
    fn from(key: RsaPublicKey) -> Self {
        Self::Public(key)
    }
}

/// Raw big-endian components of an RSA public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyComponents {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
}

impl PublicKeyComponents {
    pub fn from_key(key: &RsaPublicKey) -> Self {
        Self {
            modulus: key.n().to_bytes_be(),
            public_exponent: key.e().to_bytes_be(),
        }
    }

    /// Rebuilds the public key, rejecting malformed components.
    pub fn to_key(&self) -> CryptoResult<RsaPublicKey> {
        RsaPublicKey::new(
            BigUint::from_bytes_be(&self.modulus),
            BigUint::from_bytes_be(&self.public_exponent),
        )
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }
}

/// Generates a new RSA key pair.
///
/// `bits` must lie within the configured bounds and be a multiple of 8;
/// `public_exponent` must be one of `config.allowed_public_exponents`.
/// Large moduli take a noticeable time; async callers should go through
/// `generate_keypair_blocking`.
pub fn generate_keypair(
    config: &CryptoConfig,
    bits: usize,
    public_exponent: u64,
) -> CryptoResult<RsaKeyPair> {
    if !config.allowed_public_exponents.contains(&public_exponent) {
        return Err(CryptoError::KeyGeneration(format!(
            "public exponent {public_exponent} is not allowed"
        )));
    }
    if bits < config.min_key_bits || bits > config.max_key_bits || bits % 8 != 0 {
        return Err(CryptoError::KeyGeneration(format!(
            "key size {bits} must be a multiple of 8 in [{}, {}]",
            config.min_key_bits, config.max_key_bits
        )));
    }

    debug!("generating {bits}-bit RSA key (e = {public_exponent})");
    let private = RsaPrivateKey::new_with_exp(&mut OsRng, bits, &BigUint::from(public_exponent))
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    Ok(RsaKeyPair::from_private(private))
}

/// Generates a key pair with the configured default size and exponent.
pub fn generate_default_keypair(config: &CryptoConfig) -> CryptoResult<RsaKeyPair> {
    generate_keypair(config, config.default_key_bits, config.default_public_exponent)
}

/// Runs [`generate_keypair`] on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn generate_keypair_blocking(
    config: CryptoConfig,
    bits: usize,
    public_exponent: u64,
) -> CryptoResult<RsaKeyPair> {
    tokio::task::spawn_blocking(move || generate_keypair(&config, bits, public_exponent))
        .await
        .map_err(|e| CryptoError::KeyGeneration(format!("key generation task failed: {e}")))?
}

/// Checks that a private key is usable for signing or decryption.
pub fn check_private_key(key: &RsaPrivateKey, config: &CryptoConfig) -> CryptoResult<()> {
    key.validate()
        .map_err(|e| CryptoError::InvalidKey(format!("private key failed validation: {e}")))?;
    check_modulus(key.n().bits(), config)
}

/// Checks that a public key is usable for verification or encryption.
pub fn check_public_key(key: &RsaPublicKey, config: &CryptoConfig) -> CryptoResult<()> {
    check_modulus(key.n().bits(), config)
}

/// Checks either half of a key pair.
pub fn check_key(key: &AsymmetricKey, config: &CryptoConfig) -> CryptoResult<()> {
    match key {
        AsymmetricKey::Private(key) => check_private_key(key, config),
        AsymmetricKey::Public(key) => check_public_key(key, config),
    }
}

fn check_modulus(bits: usize, config: &CryptoConfig) -> CryptoResult<()> {
    if bits < config.min_key_bits {
        return Err(CryptoError::InvalidKey(format!(
            "{bits}-bit modulus is below the {}-bit minimum",
            config.min_key_bits
        )));
    }
    Ok(())
}
