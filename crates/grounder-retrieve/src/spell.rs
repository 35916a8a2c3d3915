//! Dictionary-based spell correction over the corpus lexicon.
//!
//! Classic candidate-generation corrector: a misspelled word is replaced by
//! the highest-frequency known word within edit distance 2. The dictionary
//! is the indexed corpus itself, so domain vocabulary ("kubernetes",
//! project names) is never "corrected" away.

use grounder_core::Lexicon;
use std::sync::Arc;

const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Word-by-word spell corrector backed by a shared [`Lexicon`].
pub struct SpellCorrector {
    lexicon: Arc<Lexicon>,
}

impl SpellCorrector {
    /// Create a corrector over the given lexicon.
    #[must_use]
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Correct a whole query, word by word, preserving word order.
    #[must_use]
    pub fn correct_query(&self, query: &str) -> String {
        query
            .split_whitespace()
            .map(|word| self.correct_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Correct a single word.
    ///
    /// Known words, non-alphabetic tokens, and words with no known
    /// candidate come back unchanged.
    #[must_use]
    pub fn correct_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if lower.chars().count() < 2 || !lower.chars().all(char::is_alphabetic) {
            return word.to_string();
        }
        if self.lexicon.contains(&lower) {
            return word.to_string();
        }

        let one_away = edits1(&lower);
        if let Some(best) = self.best_known(one_away.iter()) {
            return best;
        }

        let mut best: Option<(String, u64)> = None;
        for edit in &one_away {
            for candidate in edits1(edit) {
                let freq = self.lexicon.frequency(&candidate);
                if freq > 0 && best.as_ref().map_or(true, |(_, f)| freq > *f) {
                    best = Some((candidate, freq));
                }
            }
        }

        best.map_or_else(|| word.to_string(), |(candidate, _)| candidate)
    }

    fn best_known<'a>(&self, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
        candidates
            .map(|c| (c, self.lexicon.frequency(c)))
            .filter(|(_, freq)| *freq > 0)
            .max_by_key(|(_, freq)| *freq)
            .map(|(c, _)| c.clone())
    }
}

/// All strings one edit away: deletes, transposes, replaces, inserts.
fn edits1(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let mut edits = Vec::with_capacity(n * (ALPHABET.len() * 2 + 2) + ALPHABET.len());

    for i in 0..n {
        // Delete
        let mut deleted: String = chars[..i].iter().collect();
        deleted.extend(&chars[i + 1..]);
        edits.push(deleted);

        // Transpose with the next char
        if i + 1 < n {
            let mut swapped = chars.clone();
            swapped.swap(i, i + 1);
            edits.push(swapped.into_iter().collect());
        }

        // Replace
        for &c in ALPHABET {
            if c != chars[i] {
                let mut replaced = chars.clone();
                replaced[i] = c;
                edits.push(replaced.into_iter().collect());
            }
        }
    }

    // Insert at every position, including the end
    for i in 0..=n {
        for &c in ALPHABET {
            let mut inserted: String = chars[..i].iter().collect();
            inserted.push(c);
            inserted.extend(&chars[i..]);
            edits.push(inserted);
        }
    }

    edits
}
