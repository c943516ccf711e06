//! Secure random byte generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{CryptoError, CryptoResult};

/// A source of cryptographically strong random bytes.
pub trait RandomSource: Send + Sync {
    /// Fills `buf` entirely with random bytes.
    fn fill_bytes(&self, buf: &mut [u8]) -> CryptoResult<()>;

    /// Returns `n` fresh random bytes.
    fn strong_random_bytes(&self, n: usize) -> CryptoResult<Vec<u8>> {
        let mut bytes = vec![0u8; n];
        self.fill_bytes(&mut bytes)?;
        Ok(bytes)
    }

    /// Returns `n` random bytes encoded as URL-safe base64 without padding.
    fn random_token(&self, n: usize) -> CryptoResult<String> {
        Ok(URL_SAFE_NO_PAD.encode(self.strong_random_bytes(n)?))
    }
}

/// Operating-system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, buf: &mut [u8]) -> CryptoResult<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::InsufficientEntropy(e.to_string()))
    }
}

/// Returns `n` random bytes from the operating system.
pub fn strong_random_bytes(n: usize) -> CryptoResult<Vec<u8>> {
    OsRandom.strong_random_bytes(n)
}
