use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Relative frequency of every character observed in a corpus.
///
/// Built once from the training sentences and never mutated afterwards.
/// Characters that never appeared have probability `0.0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterModel {
    probs: HashMap<char, f64>,
}

impl CharacterModel {
    /// Creates a new instance of [`CharacterModel`] from a set of sentences.
    ///
    /// # Arguments
    /// * `sentences` - The corpus; every character of every sentence is counted.
    ///
    /// # Returns
    /// A model whose probabilities sum to 1 over the observed alphabet,
    /// or an empty model if the corpus holds no characters.
    pub fn from_corpus<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<char, u64> = HashMap::new();
        let mut total = 0u64;
        for sentence in sentences {
            for ch in sentence.as_ref().chars() {
                *counts.entry(ch).or_insert(0) += 1;
                total += 1;
            }
        }

        let probs = counts
            .into_iter()
            .map(|(ch, n)| (ch, n as f64 / total as f64))
            .collect();
        CharacterModel { probs }
    }

    pub fn probability(&self, ch: char) -> f64 {
        self.probs.get(&ch).copied().unwrap_or(0.0)
    }

    /// Number of distinct characters observed.
    pub fn alphabet_size(&self) -> usize {
        self.probs.len()
    }
}
