//! Error types for keyseal cryptographic operations.

use thiserror::Error;

/// Result type for keyseal operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in keyseal operations.
///
/// None of these are transient. A failed cryptographic operation is never
/// retried internally; the caller decides what to do with it.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("malformed envelope: {0}")]
    Deserialization(String),

    #[error("stream authentication tag mismatch")]
    Integrity,

    #[error("invalid data size: {len} bytes (must be a multiple of 4 between 4 and 1024)")]
    InvalidDataSize { len: usize },

    #[error("word {position} ('{word}') is not in the vocabulary")]
    InvalidWord { word: String, position: usize },

    #[error("mnemonic checksum mismatch")]
    InvalidChecksum,

    #[error("random source failed: {0}")]
    InsufficientEntropy(String),

    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
