//! Cryptographic parameter configuration.
//!
//! Values that would otherwise be module constants (permitted RSA
//! exponents, key size bounds, stream chunking) live here and are passed
//! explicitly to the operations that validate against them.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// How the running stream tag is keyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMode {
    /// HMAC keyed directly with the associated data, over `iv ‖ ciphertext`.
    #[default]
    AssociatedDataKey,
    /// HMAC keyed with a key derived from the stream key via HKDF, over
    /// `len(ad) ‖ ad ‖ iv ‖ ciphertext`.
    DerivedKey,
}

/// Configuration for key generation, envelopes and streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Public exponents accepted by key generation.
    pub allowed_public_exponents: Vec<u64>,

    /// Exponent used when the caller does not pick one.
    pub default_public_exponent: u64,

    /// Smallest RSA modulus (in bits) accepted for generation and use.
    pub min_key_bits: usize,

    /// Largest RSA modulus (in bits) accepted for generation.
    pub max_key_bits: usize,

    /// Modulus size used when the caller does not pick one.
    pub default_key_bits: usize,

    /// Buffer size for the `Read`/`Write` stream adapters.
    pub stream_chunk_size: usize,

    /// Keying of the running stream tag.
    pub tag_mode: TagMode,

    /// Iterations for the hash-chaining key derivation.
    pub kdf_rounds: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            allowed_public_exponents: vec![3, 5, 17, 257, 65537],
            default_public_exponent: 65537,
            min_key_bits: 1024,
            max_key_bits: 4096,
            default_key_bits: 2048,
            stream_chunk_size: 64 * 1024,
            tag_mode: TagMode::AssociatedDataKey,
            kdf_rounds: 1000,
        }
    }
}

impl CryptoConfig {
    /// Checks the configuration for internally inconsistent values.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.allowed_public_exponents.is_empty() {
            return Err(CryptoError::Config("no public exponents allowed".to_string()));
        }
        if let Some(e) = self
            .allowed_public_exponents
            .iter()
            .find(|&&e| e < 3 || e % 2 == 0)
        {
            return Err(CryptoError::Config(format!(
                "public exponent {e} must be odd and at least 3"
            )));
        }
        if !self
            .allowed_public_exponents
            .contains(&self.default_public_exponent)
        {
            return Err(CryptoError::Config(format!(
                "default public exponent {} is not in the allowed list",
                self.default_public_exponent
            )));
        }
        if self.min_key_bits > self.max_key_bits {
            return Err(CryptoError::Config(format!(
                "min_key_bits {} exceeds max_key_bits {}",
                self.min_key_bits, self.max_key_bits
            )));
        }
        if !(self.min_key_bits..=self.max_key_bits).contains(&self.default_key_bits) {
            return Err(CryptoError::Config(format!(
                "default_key_bits {} outside [{}, {}]",
                self.default_key_bits, self.min_key_bits, self.max_key_bits
            )));
        }
        if self.stream_chunk_size == 0 {
            return Err(CryptoError::Config("stream_chunk_size must be non-zero".to_string()));
        }
        if self.kdf_rounds == 0 {
            return Err(CryptoError::Config("kdf_rounds must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Returns the config with `tag_mode` replaced.
    pub fn with_tag_mode(mut self, tag_mode: TagMode) -> Self {
        self.tag_mode = tag_mode;
        self
    }
}
