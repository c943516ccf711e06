//! Authenticated asymmetric envelopes.
//!
//! Sealing encrypts the message for the recipient, then signs the
//! *ciphertext* with the sender's private key. Opening verifies that
//! signature before anything is decrypted, so unauthenticated ciphertext
//! never reaches the decryption primitive.
//!
//! The encryption key pair and the signing key pair are independent: a
//! valid signature says nothing about whether the decrypt key matches.
//!
//! # Wire format (v1)
//!
//! ```text
//! [u32 big-endian signature length][signature][ciphertext (rest)]
//! ```

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, warn};

use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{AsymmetricKey, check_key, check_private_key};
use crate::provider::{PrimitiveProvider, RustCryptoProvider};

/// Size of the signature length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// A signed ciphertext. The signature covers exactly `ciphertext`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    signature: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Pairs a signature with the ciphertext it was computed over.
    pub fn new(signature: Vec<u8>, ciphertext: Vec<u8>) -> CryptoResult<Self> {
        if u32::try_from(signature.len()).is_err() {
            return Err(CryptoError::Signing(format!(
                "signature of {} bytes does not fit the length prefix",
                signature.len()
            )));
        }
        Ok(Self { signature, ciphertext })
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes to the v1 wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Envelope::new guarantees the length fits in a u32.
        let len = self.signature.len() as u32;
        let mut out =
            Vec::with_capacity(LENGTH_PREFIX_SIZE + self.signature.len() + self.ciphertext.len());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses the v1 wire format.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let Some((prefix, rest)) = bytes.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
            return Err(CryptoError::Deserialization(format!(
                "{} bytes is shorter than the length prefix",
                bytes.len()
            )));
        };

        let signature_len = u32::from_be_bytes(*prefix) as usize;
        if signature_len > rest.len() {
            return Err(CryptoError::Deserialization(format!(
                "declared signature length {signature_len} exceeds remaining {} bytes",
                rest.len()
            )));
        }

        let (signature, ciphertext) = rest.split_at(signature_len);
        Ok(Self {
            signature: signature.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Wire format encoded as URL-safe base64 without padding.
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Deserialization(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypt-then-sign / verify-then-decrypt over a primitive provider.
pub struct AsymmetricEnvelope<P = RustCryptoProvider> {
    provider: P,
    config: CryptoConfig,
}

impl AsymmetricEnvelope<RustCryptoProvider> {
    pub fn new(config: CryptoConfig) -> Self {
        Self::with_provider(RustCryptoProvider, config)
    }
}

impl Default for AsymmetricEnvelope<RustCryptoProvider> {
    fn default() -> Self {
        Self::new(CryptoConfig::default())
    }
}

impl<P: PrimitiveProvider> AsymmetricEnvelope<P> {
    pub fn with_provider(provider: P, config: CryptoConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Encrypts `message` under `encrypt_key` and signs the ciphertext with
    /// `sign_key`.
    pub fn authenticated_encrypt(
        &self,
        encrypt_key: &AsymmetricKey,
        sign_key: &RsaPrivateKey,
        message: &[u8],
    ) -> CryptoResult<Envelope> {
        check_key(encrypt_key, &self.config)?;
        check_private_key(sign_key, &self.config)?;

        let ciphertext = self.provider.encrypt(encrypt_key, message)?;
        let signature = self.provider.sign(sign_key, &ciphertext)?;

        debug!(
            "sealed {}-byte message into {}-byte ciphertext",
            message.len(),
            ciphertext.len()
        );
        Envelope::new(signature, ciphertext)
    }

    /// Parses `envelope_bytes`, verifies the signature and only then
    /// decrypts.
    pub fn authenticated_decrypt(
        &self,
        decrypt_key: &AsymmetricKey,
        verify_key: &RsaPublicKey,
        envelope_bytes: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let envelope = Envelope::from_bytes(envelope_bytes)?;
        self.open(decrypt_key, verify_key, &envelope)
    }

    /// Verify-then-decrypt on an already parsed envelope.
    pub fn open(
        &self,
        decrypt_key: &AsymmetricKey,
        verify_key: &RsaPublicKey,
        envelope: &Envelope,
    ) -> CryptoResult<Vec<u8>> {
        if !self
            .provider
            .verify(verify_key, &envelope.ciphertext, &envelope.signature)
        {
            warn!(
                "rejected envelope with invalid signature ({} byte ciphertext)",
                envelope.ciphertext.len()
            );
            return Err(CryptoError::InvalidSignature);
        }

        self.provider.decrypt(decrypt_key, &envelope.ciphertext)
    }
}

/// [`AsymmetricEnvelope::authenticated_encrypt`] with the default provider
/// and configuration.
pub fn authenticated_encrypt(
    encrypt_key: &AsymmetricKey,
    sign_key: &RsaPrivateKey,
    message: &[u8],
) -> CryptoResult<Envelope> {
    AsymmetricEnvelope::default().authenticated_encrypt(encrypt_key, sign_key, message)
}

/// [`AsymmetricEnvelope::authenticated_decrypt`] with the default provider
/// and configuration.
pub fn authenticated_decrypt(
    decrypt_key: &AsymmetricKey,
    verify_key: &RsaPublicKey,
    envelope_bytes: &[u8],
) -> CryptoResult<Vec<u8>> {
    AsymmetricEnvelope::default().authenticated_decrypt(decrypt_key, verify_key, envelope_bytes)
}
