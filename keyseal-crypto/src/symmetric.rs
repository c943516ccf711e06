//! AES block (CBC) and counter-mode transforms.
//!
//! The AES variant is picked from the key length: 16, 24 or 32 bytes select
//! AES-128, AES-192 or AES-256. The counter is the full 128-bit IV,
//! incremented big-endian.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};
use crate::random::RandomSource;

/// AES block size, which is also the IV size for CBC and CTR.
pub const IV_SIZE: usize = 16;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes192Ctr = ctr::Ctr128BE<Aes192>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A symmetric AES key of 16, 24 or 32 bytes. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// Wraps raw key bytes, rejecting lengths AES does not support.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self { bytes: bytes.to_vec() }),
            other => Err(CryptoError::InvalidKey(format!(
                "AES key must be 16, 24 or 32 bytes, got {other}"
            ))),
        }
    }

    pub(crate) fn from_array(bytes: &[u8; 32]) -> Self {
        Self { bytes: bytes.to_vec() }
    }

    /// Draws a fresh 256-bit key.
    pub fn generate(random: &dyn RandomSource) -> CryptoResult<Self> {
        let mut bytes = vec![0u8; 32];
        random.fill_bytes(&mut bytes)?;
        Ok(Self { bytes })
    }

    /// Be careful with this - avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey({} bits, [REDACTED])", self.bytes.len() * 8)
    }
}

/// Draws a random 16-byte IV.
pub fn generate_iv(random: &dyn RandomSource) -> CryptoResult<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    random.fill_bytes(&mut iv)?;
    Ok(iv)
}

/// Encrypts `plaintext` with AES-CBC and PKCS#7 padding.
pub fn block_encrypt(key: &SymmetricKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let iv = GenericArray::from_slice(iv);
    let key = key.as_bytes();
    match key.len() {
        16 => cbc::Encryptor::<Aes128>::new(GenericArray::from_slice(key), iv)
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<Aes192>::new(GenericArray::from_slice(key), iv)
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => cbc::Encryptor::<Aes256>::new(GenericArray::from_slice(key), iv)
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    }
}

/// Decrypts AES-CBC ciphertext and strips PKCS#7 padding.
///
/// CBC carries no authentication; a wrong key is only detected when the
/// padding happens not to parse.
pub fn block_decrypt(
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let iv = GenericArray::from_slice(iv);
    let key = key.as_bytes();
    let result = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new(GenericArray::from_slice(key), iv)
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<Aes192>::new(GenericArray::from_slice(key), iv)
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        _ => cbc::Decryptor::<Aes256>::new(GenericArray::from_slice(key), iv)
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    result.map_err(|e| CryptoError::Decryption(format!("CBC unpad failed: {e}")))
}

/// Counter-mode keystream positioned at the start of a stream.
///
/// Applying the keystream is its own inverse, so the same type serves both
/// directions.
pub enum CounterMode {
    Aes128(Aes128Ctr),
    Aes192(Aes192Ctr),
    Aes256(Aes256Ctr),
}

impl CounterMode {
    pub fn new(key: &SymmetricKey, iv: &[u8; IV_SIZE]) -> Self {
        let iv = GenericArray::from_slice(iv);
        let key = key.as_bytes();
        match key.len() {
            16 => Self::Aes128(Aes128Ctr::new(GenericArray::from_slice(key), iv)),
            24 => Self::Aes192(Aes192Ctr::new(GenericArray::from_slice(key), iv)),
            _ => Self::Aes256(Aes256Ctr::new(GenericArray::from_slice(key), iv)),
        }
    }

    /// XORs the next `buf.len()` keystream bytes into `buf`.
    pub fn apply(&mut self, buf: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.apply_keystream(buf),
            Self::Aes192(c) => c.apply_keystream(buf),
            Self::Aes256(c) => c.apply_keystream(buf),
        }
    }
}
