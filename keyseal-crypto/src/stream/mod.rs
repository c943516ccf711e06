//! Streaming counter-mode encryption with a stream-wide authentication tag.
//!
//! Encryption is single pass: each chunk is run through AES-CTR, folded into
//! a running HMAC-SHA256 and handed back immediately. The tag covers
//! `iv ‖ ciphertext` and is only available once the whole input has been
//! consumed.
//!
//! Decryption is verify-then-decrypt, which costs a second pass:
//!
//! ```text
//! pass 1: ciphertext chunks ──► HMAC ──► compare with expected tag
//! pass 2: ciphertext chunks ──► AES-CTR ──► plaintext   (only if pass 1 matched)
//! ```
//!
//! The ciphertext therefore has to be either buffered or re-readable
//! (`Read + Seek`), and the first plaintext byte is only available after the
//! last ciphertext byte was hashed. On a tag mismatch no plaintext at all is
//! produced.
//!
//! A `(key, iv)` pair must never encrypt two different streams; reusing it
//! reuses the keystream. Nothing here can detect that.

pub mod io;
#[cfg(feature = "async")]
pub mod pipeline;

use hkdf::Hkdf;
use hmac::Mac;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::config::{CryptoConfig, TagMode};
use crate::error::{CryptoError, CryptoResult};
use crate::hash::{HmacSha256, KEYED_HASH_SIZE, keyed_hash_init};
use crate::symmetric::{CounterMode, IV_SIZE, SymmetricKey};

/// Size of a stream tag in bytes.
pub const TAG_SIZE: usize = KEYED_HASH_SIZE;

/// HKDF info label for [`TagMode::DerivedKey`].
const DERIVED_MAC_INFO: &[u8] = b"keyseal stream mac v1";

/// Authentication tag over `iv ‖ ciphertext` of a whole stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamTag([u8; TAG_SIZE]);

impl StreamTag {
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let tag: [u8; TAG_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::Deserialization(format!(
                "stream tag must be {TAG_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(tag))
    }

    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }
}

/// Starts the running MAC and folds in everything that precedes the
/// ciphertext.
fn start_mac(
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
    associated_data: &[u8],
    mode: TagMode,
) -> HmacSha256 {
    let mut mac = match mode {
        TagMode::AssociatedDataKey => keyed_hash_init(associated_data),
        TagMode::DerivedKey => {
            let mut mac_key = [0u8; KEYED_HASH_SIZE];
            let hkdf = Hkdf::<Sha256>::new(None, key.as_bytes());
            hkdf.expand(DERIVED_MAC_INFO, &mut mac_key)
                .expect("32 bytes is within the HKDF-SHA256 output limit");
            let mut mac = keyed_hash_init(&mac_key);
            mac_key.zeroize();
            mac.update(&(associated_data.len() as u64).to_be_bytes());
            mac.update(associated_data);
            mac
        }
    };
    mac.update(iv);
    mac
}

/// Single-use encrypting session.
///
/// Dropping it before [`finalize`](Self::finalize) abandons the stream; any
/// ciphertext already emitted has no tag and must be discarded.
pub struct StreamEncryptor {
    ctr: CounterMode,
    mac: HmacSha256,
    bytes: u64,
}

impl StreamEncryptor {
    pub fn new(
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
        mode: TagMode,
    ) -> Self {
        Self {
            ctr: CounterMode::new(key, iv),
            mac: start_mac(key, iv, associated_data, mode),
            bytes: 0,
        }
    }

    /// Encrypts `buf` in place and folds the ciphertext into the tag.
    pub fn update_in_place(&mut self, buf: &mut [u8]) {
        self.ctr.apply(buf);
        self.mac.update(buf);
        self.bytes += buf.len() as u64;
    }

    /// Encrypts one chunk.
    pub fn update(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut out = chunk.to_vec();
        self.update_in_place(&mut out);
        out
    }

    /// Number of bytes encrypted so far.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes
    }

    /// Ends the stream and returns its tag.
    pub fn finalize(self) -> StreamTag {
        debug!("encrypted {}-byte stream", self.bytes);
        StreamTag(self.mac.finalize().into_bytes().into())
    }
}

/// First pass of decryption: authenticates ciphertext without decrypting it.
pub struct StreamDecryptor {
    ctr: CounterMode,
    mac: HmacSha256,
    bytes: u64,
}

impl StreamDecryptor {
    pub fn new(
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
        mode: TagMode,
    ) -> Self {
        Self {
            ctr: CounterMode::new(key, iv),
            mac: start_mac(key, iv, associated_data, mode),
            bytes: 0,
        }
    }

    /// Folds the next ciphertext chunk into the running tag.
    pub fn authenticate(&mut self, ciphertext: &[u8]) {
        self.mac.update(ciphertext);
        self.bytes += ciphertext.len() as u64;
    }

    /// Compares the running tag with `expected` in constant time.
    ///
    /// On success returns the keystream for the second pass, which must be
    /// fed the same ciphertext again.
    pub fn verify(self, expected: &StreamTag) -> CryptoResult<VerifiedStream> {
        if self.mac.verify_slice(expected.as_bytes()).is_err() {
            warn!("stream tag mismatch after {} bytes; no plaintext released", self.bytes);
            return Err(CryptoError::Integrity);
        }
        debug!("authenticated {}-byte stream", self.bytes);
        Ok(VerifiedStream {
            ctr: self.ctr,
            authenticated: self.bytes,
            decrypted: 0,
        })
    }
}

/// Second pass of decryption, only reachable through a successful
/// [`StreamDecryptor::verify`].
///
/// Refuses to decrypt more bytes than were authenticated.
pub struct VerifiedStream {
    ctr: CounterMode,
    authenticated: u64,
    decrypted: u64,
}

impl VerifiedStream {
    /// Decrypts `buf` in place.
    pub fn decrypt_in_place(&mut self, buf: &mut [u8]) -> CryptoResult<()> {
        let total = self.decrypted + buf.len() as u64;
        if total > self.authenticated {
            return Err(CryptoError::Integrity);
        }
        self.ctr.apply(buf);
        self.decrypted = total;
        Ok(())
    }

    /// Decrypts one chunk.
    pub fn decrypt(&mut self, chunk: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut out = chunk.to_vec();
        self.decrypt_in_place(&mut out)?;
        Ok(out)
    }

    /// Number of ciphertext bytes covered by the verified tag.
    pub fn authenticated_len(&self) -> u64 {
        self.authenticated
    }

    /// Checks that exactly the authenticated number of bytes was decrypted.
    pub fn finish(self) -> CryptoResult<()> {
        if self.decrypted != self.authenticated {
            return Err(CryptoError::Integrity);
        }
        Ok(())
    }
}

/// Streaming authenticated cipher configured by a [`CryptoConfig`].
#[derive(Clone, Debug, Default)]
pub struct StreamCipherAuthenticator {
    config: CryptoConfig,
}

impl StreamCipherAuthenticator {
    pub fn new(config: CryptoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CryptoConfig {
        &self.config
    }

    pub fn encryptor(
        &self,
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
    ) -> StreamEncryptor {
        StreamEncryptor::new(key, iv, associated_data, self.config.tag_mode)
    }

    pub fn decryptor(
        &self,
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
    ) -> StreamDecryptor {
        StreamDecryptor::new(key, iv, associated_data, self.config.tag_mode)
    }

    /// Encrypts chunks in order, preserving chunk boundaries.
    pub fn encrypt<I, C>(
        &self,
        chunks: I,
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
    ) -> (Vec<Vec<u8>>, StreamTag)
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut encryptor = self.encryptor(key, iv, associated_data);
        let ciphertext = chunks
            .into_iter()
            .map(|chunk| encryptor.update(chunk.as_ref()))
            .collect();
        (ciphertext, encryptor.finalize())
    }

    /// Authenticates every chunk, then decrypts them all.
    ///
    /// Returns `Integrity` without any plaintext if the tag does not match.
    pub fn decrypt<C: AsRef<[u8]>>(
        &self,
        chunks: &[C],
        key: &SymmetricKey,
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
        expected: &StreamTag,
    ) -> CryptoResult<Vec<Vec<u8>>> {
        let mut decryptor = self.decryptor(key, iv, associated_data);
        for chunk in chunks {
            decryptor.authenticate(chunk.as_ref());
        }

        let mut verified = decryptor.verify(expected)?;
        let plaintext = chunks
            .iter()
            .map(|chunk| verified.decrypt(chunk.as_ref()))
            .collect::<CryptoResult<Vec<_>>>()?;
        verified.finish()?;
        Ok(plaintext)
    }
}
