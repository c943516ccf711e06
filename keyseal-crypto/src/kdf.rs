//! Hash-chaining key derivation.
//!
//! This is a plain iterated SHA-256, not a password-hardening KDF. It turns
//! an already high-entropy secret (a mnemonic's data, a shared token) into a
//! fixed-size symmetric key.
//!
//! ```text
//! h0     = SHA-256(salt ‖ secret)
//! h(i+1) = SHA-256(h(i) ‖ secret)
//! key    = h(rounds - 1)
//! ```

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::SymmetricKey;

/// Size of a derived key in bytes.
pub const DERIVED_KEY_SIZE: usize = 32;

/// A 256-bit key produced by [`derive_key`]. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_SIZE]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.0
    }

    /// Uses the derived bytes as an AES-256 key.
    pub fn to_symmetric_key(&self) -> SymmetricKey {
        SymmetricKey::from_array(&self.0)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

/// Derives a 32-byte key from `secret` by chaining SHA-256 `rounds` times.
pub fn derive_key(secret: &[u8], salt: &[u8], rounds: u32) -> CryptoResult<DerivedKey> {
    if rounds == 0 {
        return Err(CryptoError::Config("kdf rounds must be at least 1".to_string()));
    }

    let mut state: [u8; DERIVED_KEY_SIZE] = Sha256::new()
        .chain_update(salt)
        .chain_update(secret)
        .finalize()
        .into();

    for _ in 1..rounds {
        let next: [u8; DERIVED_KEY_SIZE] = Sha256::new()
            .chain_update(state)
            .chain_update(secret)
            .finalize()
            .into();
        state.zeroize();
        state = next;
    }

    Ok(DerivedKey(state))
}

/// [`derive_key`] with the configured number of rounds.
pub fn derive_key_with_config(
    config: &CryptoConfig,
    secret: &[u8],
    salt: &[u8],
) -> CryptoResult<DerivedKey> {
    derive_key(secret, salt, config.kdf_rounds)
}
