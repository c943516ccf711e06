//! Reversible encoding of binary data as a checksummed word phrase.
//!
//! `n` bytes of data carry `8n / 32` checksum bits taken from the front of
//! SHA-256(data). Data bits followed by checksum bits are cut into 11-bit
//! big-endian groups, each naming one word of a 2048-word [`Vocabulary`]:
//!
//! ```text
//! data bytes   checksum bits   total bits   words
//!      4             1              33         3
//!     16             4             132        12
//!     32             8             264        24
//!   1024           256            8448       768
//! ```
//!
//! For 16 to 32 bytes and the English list this is the BIP-39 encoding.

mod vocabulary;

use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::random::RandomSource;

pub use vocabulary::{VOCABULARY_SIZE, Vocabulary};

/// Smallest encodable data size in bytes.
pub const MIN_DATA_SIZE: usize = 4;
/// Largest encodable data size in bytes.
pub const MAX_DATA_SIZE: usize = 1024;

const BITS_PER_WORD: usize = 11;

fn check_data_size(len: usize) -> CryptoResult<()> {
    if !(MIN_DATA_SIZE..=MAX_DATA_SIZE).contains(&len) || len % 4 != 0 {
        return Err(CryptoError::InvalidDataSize { len });
    }
    Ok(())
}

fn bit_at(bytes: &[u8], i: usize) -> bool {
    bytes[i / 8] & (0x80 >> (i % 8)) != 0
}

/// Leading bits of SHA-256 over the encoded data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checksum {
    /// Bits packed MSB first; unused trailing bits are zero.
    bytes: Vec<u8>,
    bit_len: usize,
}

impl Checksum {
    fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self::from_bits(&digest, 0, data.len() * 8 / 32)
    }

    /// Copies `bit_len` bits of `src` starting at bit `offset`.
    fn from_bits(src: &[u8], offset: usize, bit_len: usize) -> Self {
        let mut bytes = vec![0u8; bit_len.div_ceil(8)];
        for i in 0..bit_len {
            if bit_at(src, offset + i) {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self { bytes, bit_len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }
}

/// Data together with its checksum and word encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct MnemonicPhrase {
    data: Vec<u8>,
    checksum: Checksum,
    words: String,
}

impl MnemonicPhrase {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Words joined by single spaces.
    pub fn words(&self) -> &str {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.split(' ').count()
    }
}

impl Drop for MnemonicPhrase {
    fn drop(&mut self) {
        self.data.zeroize();
        self.words.zeroize();
    }
}

impl std::fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("data_len", &self.data.len())
            .field("word_count", &self.word_count())
            .finish_non_exhaustive()
    }
}

/// Encodes and decodes [`MnemonicPhrase`]s over a fixed vocabulary.
#[derive(Clone, Debug)]
pub struct MnemonicCodec {
    vocabulary: Vocabulary,
}

impl Default for MnemonicCodec {
    fn default() -> Self {
        Self::english()
    }
}

impl MnemonicCodec {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Codec over the BIP-39 English word list.
    pub fn english() -> Self {
        Self::new(Vocabulary::english())
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Encodes `data`, which must be a multiple of 4 bytes between 4 and
    /// 1024.
    pub fn from_entropy(&self, data: &[u8]) -> CryptoResult<MnemonicPhrase> {
        check_data_size(data.len())?;

        let checksum = Checksum::of(data);
        let total_bits = data.len() * 8 + checksum.bit_len;

        // Data is byte aligned, so the checksum bytes continue the bitstream.
        let mut stream = Vec::with_capacity(data.len() + checksum.bytes.len());
        stream.extend_from_slice(data);
        stream.extend_from_slice(&checksum.bytes);

        let words = (0..total_bits / BITS_PER_WORD)
            .map(|w| {
                let index = (0..BITS_PER_WORD).fold(0u16, |acc, b| {
                    (acc << 1) | u16::from(bit_at(&stream, w * BITS_PER_WORD + b))
                });
                self.vocabulary.word_for(index)
            })
            .collect::<Vec<_>>()
            .join(" ");
        stream.zeroize();

        Ok(MnemonicPhrase {
            data: data.to_vec(),
            checksum,
            words,
        })
    }

    /// Decodes a phrase back into its data, verifying the checksum.
    ///
    /// Words may be separated by any whitespace. The returned phrase carries
    /// the canonical single-space spelling.
    pub fn to_entropy(&self, phrase: &str) -> CryptoResult<MnemonicPhrase> {
        let indices = phrase
            .split_whitespace()
            .enumerate()
            .map(|(position, word)| {
                self.vocabulary
                    .index_of(word)
                    .ok_or_else(|| CryptoError::InvalidWord {
                        word: word.to_string(),
                        position,
                    })
            })
            .collect::<CryptoResult<Vec<u16>>>()?;

        let total_bits = indices.len() * BITS_PER_WORD;
        let checksum_bits = (total_bits - total_bits / 33) / 32;
        let data_len = (total_bits - checksum_bits) / 8;
        if data_len * 8 + checksum_bits != total_bits {
            return Err(CryptoError::InvalidChecksum);
        }
        check_data_size(data_len)?;

        let mut stream = vec![0u8; total_bits.div_ceil(8)];
        for (w, &index) in indices.iter().enumerate() {
            for b in 0..BITS_PER_WORD {
                if index & (1 << (BITS_PER_WORD - 1 - b)) != 0 {
                    let i = w * BITS_PER_WORD + b;
                    stream[i / 8] |= 0x80 >> (i % 8);
                }
            }
        }

        let data = stream[..data_len].to_vec();
        let embedded = Checksum::from_bits(&stream, data_len * 8, checksum_bits);
        stream.zeroize();

        let checksum = Checksum::of(&data);
        if checksum != embedded {
            return Err(CryptoError::InvalidChecksum);
        }

        Ok(MnemonicPhrase {
            data,
            checksum,
            words: phrase.split_whitespace().collect::<Vec<_>>().join(" "),
        })
    }

    /// Draws `entropy_bytes` of fresh data and encodes it.
    pub fn generate(
        &self,
        entropy_bytes: usize,
        random: &dyn RandomSource,
    ) -> CryptoResult<MnemonicPhrase> {
        check_data_size(entropy_bytes)?;
        let mut entropy = random.strong_random_bytes(entropy_bytes)?;
        let phrase = self.from_entropy(&entropy);
        entropy.zeroize();
        debug!("generated {}-byte mnemonic", entropy_bytes);
        phrase
    }
}
