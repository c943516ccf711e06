//! Asymmetric primitive provider.
//!
//! [`AsymmetricEnvelope`](crate::envelope::AsymmetricEnvelope) composes these
//! four operations and never touches RSA directly, so the provider can be
//! swapped (or instrumented in tests).
//!
//! [`RustCryptoProvider`] uses:
//! - RSASSA-PKCS1-v1_5 with SHA-256 for signatures
//! - RSAES-PKCS1-v1_5 for public-key encryption
//! - PKCS#1 type-1 padding for private-key encryption, recovered with the
//!   public key

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::AsymmetricKey;

/// Minimum PKCS#1 padding string length.
const MIN_PADDING_LEN: usize = 8;

/// Asymmetric sign/verify/encrypt/decrypt operations.
pub trait PrimitiveProvider: Send + Sync {
    /// Signs `data` with a private key.
    fn sign(&self, key: &RsaPrivateKey, data: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Returns whether `signature` is a valid signature over `data`.
    fn verify(&self, key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> bool;

    /// Encrypts with either half of a key pair.
    fn encrypt(&self, key: &AsymmetricKey, data: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Decrypts with the half opposite to the one used for encryption.
    fn decrypt(&self, key: &AsymmetricKey, data: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// Provider backed by the RustCrypto `rsa` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCryptoProvider;

impl PrimitiveProvider for RustCryptoProvider {
    fn sign(&self, key: &RsaPrivateKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let digest = Sha256::digest(data);
        key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }

    fn verify(&self, key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(data);
        key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .is_ok()
    }

    fn encrypt(&self, key: &AsymmetricKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        match key {
            AsymmetricKey::Public(key) => key
                .encrypt(&mut OsRng, Pkcs1v15Encrypt, data)
                .map_err(|e| CryptoError::Encryption(e.to_string())),
            AsymmetricKey::Private(key) => key
                .sign(Pkcs1v15Sign::new_unprefixed(), data)
                .map_err(|e| CryptoError::Encryption(e.to_string())),
        }
    }

    fn decrypt(&self, key: &AsymmetricKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        match key {
            AsymmetricKey::Private(key) => key
                .decrypt(Pkcs1v15Encrypt, data)
                .map_err(|e| CryptoError::Decryption(e.to_string())),
            AsymmetricKey::Public(key) => decrypt_public(key, data),
        }
    }
}

/// Recovers data encrypted with the private key: raw RSA public operation,
/// then strips `00 01 FF..FF 00` padding.
fn decrypt_public(key: &RsaPublicKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
    let k = key.size();
    if data.len() != k {
        return Err(CryptoError::Decryption(format!(
            "ciphertext is {} bytes, modulus is {k}",
            data.len()
        )));
    }

    let c = BigUint::from_bytes_be(data);
    if &c >= key.n() {
        return Err(CryptoError::Decryption("ciphertext out of range".to_string()));
    }

    let m = c.modpow(key.e(), key.n()).to_bytes_be();
    let mut em = vec![0u8; k - m.len()];
    em.extend_from_slice(&m);

    let malformed = || CryptoError::Decryption("invalid type-1 padding".to_string());
    if em.len() < 2 + MIN_PADDING_LEN + 1 || em[0] != 0x00 || em[1] != 0x01 {
        return Err(malformed());
    }
    let padding_len = em[2..].iter().take_while(|&&b| b == 0xFF).count();
    let separator = 2 + padding_len;
    if padding_len < MIN_PADDING_LEN || em.get(separator) != Some(&0x00) {
        return Err(malformed());
    }

    Ok(em[separator + 1..].to_vec())
}
