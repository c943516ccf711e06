//! Word lists for mnemonic encoding.

use std::collections::HashMap;

use crate::error::{CryptoError, CryptoResult};

/// Number of words in a vocabulary; one word encodes 11 bits.
pub const VOCABULARY_SIZE: usize = 2048;

/// An ordered list of exactly 2048 distinct words.
///
/// Lookup is case-sensitive and exact. The index of a word is its position in
/// the list, so the ordering is part of the encoding.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl Vocabulary {
    /// The standard English list.
    pub fn english() -> Self {
        let words = bip39::Language::English.word_list();
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| ((*w).to_string(), i as u16))
            .collect();
        Self {
            words: words.iter().map(|w| (*w).to_string()).collect(),
            index,
        }
    }

    /// Builds a vocabulary from an ordered word list.
    pub fn from_words<I, S>(words: I) -> CryptoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        if words.len() != VOCABULARY_SIZE {
            return Err(CryptoError::InvalidVocabulary(format!(
                "expected {VOCABULARY_SIZE} words, got {}",
                words.len()
            )));
        }

        let mut index = HashMap::with_capacity(VOCABULARY_SIZE);
        for (i, word) in words.iter().enumerate() {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                return Err(CryptoError::InvalidVocabulary(format!(
                    "entry {i} ({word:?}) is empty or contains whitespace"
                )));
            }
            if index.insert(word.clone(), i as u16).is_some() {
                return Err(CryptoError::InvalidVocabulary(format!(
                    "duplicate word '{word}' at entry {i}"
                )));
            }
        }

        Ok(Self { words, index })
    }

    /// Parses a newline-delimited word list, ignoring blank lines.
    pub fn parse(text: &str) -> CryptoResult<Self> {
        Self::from_words(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    /// Word at `index`, if in range.
    pub fn word(&self, index: u16) -> Option<&str> {
        self.words.get(usize::from(index)).map(String::as_str)
    }

    /// Word for an 11-bit group. Only the low 11 bits of `index` are used.
    pub(crate) fn word_for(&self, index: u16) -> &str {
        &self.words[usize::from(index) % VOCABULARY_SIZE]
    }

    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.index.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
