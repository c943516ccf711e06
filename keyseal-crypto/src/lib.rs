//! Authenticated envelopes, streaming authenticated encryption and mnemonic
//! encoding.
//!
//! Three independent components share one primitive layer:
//!
//! - [`AsymmetricEnvelope`]: encrypt for a recipient, then sign the
//!   ciphertext. Opening verifies the signature before anything is
//!   decrypted.
//! - [`StreamCipherAuthenticator`]: AES-CTR over arbitrarily chunked input
//!   with a running HMAC-SHA256 tag over the IV and ciphertext. Decryption
//!   is two-pass: verify the whole stream, then decrypt.
//! - [`MnemonicCodec`]: a reversible mapping from 4 to 1024 bytes of data to
//!   a checksummed phrase over a 2048-word [`Vocabulary`].
//!
//! # Architecture
//!
//! ```text
//!  AsymmetricEnvelope   StreamCipherAuthenticator   MnemonicCodec
//!          │                      │                      │
//!  PrimitiveProvider      CounterMode + HMAC        SHA-256 + Vocabulary
//!          │                      │                      │
//!          └──────────── RandomSource (OsRng) ───────────┘
//! ```
//!
//! Behavioral knobs (allowed RSA exponents, key size limits, stream chunk
//! size, tag keying) live in [`CryptoConfig`] rather than in constants.

pub mod config;
pub mod envelope;
mod error;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod mnemonic;
pub mod provider;
pub mod random;
pub mod stream;
pub mod symmetric;

pub use config::{CryptoConfig, TagMode};
pub use envelope::{AsymmetricEnvelope, Envelope, authenticated_decrypt, authenticated_encrypt};
pub use error::{CryptoError, CryptoResult};
pub use hash::{HashAlgorithm, hash, keyed_hash};
pub use kdf::{DerivedKey, derive_key, derive_key_with_config};
pub use keys::{AsymmetricKey, PublicKeyComponents, RsaKeyPair, generate_keypair};
pub use mnemonic::{Checksum, MnemonicCodec, MnemonicPhrase, Vocabulary};
pub use provider::{PrimitiveProvider, RustCryptoProvider};
pub use random::{OsRandom, RandomSource, strong_random_bytes};
pub use stream::{StreamCipherAuthenticator, StreamDecryptor, StreamEncryptor, StreamTag};
pub use symmetric::{SymmetricKey, generate_iv};

// Re-exported so callers can name key types without depending on `rsa`.
pub use rsa::{RsaPrivateKey, RsaPublicKey};
