//! Corpus vocabulary shared between indexing and retrieval.
//!
//! The indexing orchestrator feeds chunk tokens into a [`Lexicon`] as files
//! are embedded; the query-time spell corrector consults it to propose
//! corrections ranked by corpus frequency. Words that never appear in the
//! indexed corpus are never proposed, so domain terms survive correction.

use std::collections::HashMap;
use std::sync::RwLock;

/// Word-frequency vocabulary over the indexed corpus.
///
/// Cheap, synchronous, and thread-safe: reads are lock-shared, writes take
/// the lock briefly per document. Words are lowercased; tokens containing
/// non-alphabetic characters are ignored.
#[derive(Debug, Default)]
pub struct Lexicon {
    words: RwLock<HashMap<String, u64>>,
}

impl Lexicon {
    /// Create an empty lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every alphabetic token of `text` to the vocabulary.
    pub fn add_text(&self, text: &str) {
        let mut words = self.words.write().unwrap_or_else(|e| e.into_inner());
        for token in text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphabetic())
                .to_lowercase();
            if !token.is_empty() && token.chars().all(char::is_alphabetic) {
                *words.entry(token).or_insert(0) += 1;
            }
        }
    }

    /// Frequency of a (lowercased) word, 0 if unknown.
    #[must_use]
    pub fn frequency(&self, word: &str) -> u64 {
        self.words
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(word)
            .copied()
            .unwrap_or(0)
    }

    /// Whether the (lowercased) word is known.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.frequency(word) > 0
    }

    /// Number of distinct known words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the lexicon is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything (used on forced rebuilds).
    pub fn clear(&self) {
        self.words
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
