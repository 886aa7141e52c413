use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::character_model::CharacterModel;
use crate::errors::{Result, SegmentError};

/// Hyperparameters of the unigram word model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Weight of the generative prior in the additive smoothing.
    pub alpha: f64,
    /// Longest word the lattice considers, in characters.
    pub max_len: usize,
    /// Mean of the Poisson distribution over word lengths.
    pub mean_len: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            alpha: 10.0,
            max_len: 5,
            mean_len: 2.0,
        }
    }
}

impl ModelParams {
    /// Checks that every parameter lies in its valid range.
    ///
    /// # Errors
    /// Returns [`SegmentError::InvalidArgument`] if `max_len` is zero or if
    /// `alpha` or `mean_len` is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(SegmentError::invalid_argument("max_len must be at least 1"));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(SegmentError::invalid_argument(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        if !(self.mean_len.is_finite() && self.mean_len > 0.0) {
            return Err(SegmentError::invalid_argument(format!(
                "mean_len must be positive, got {}",
                self.mean_len
            )));
        }
        Ok(())
    }
}

/// Smoothed unigram model over words.
///
/// Holds an occurrence count per word and the total number of word
/// occurrences. A word missing from the table has count 0. Counts only
/// change through [`add_word`](Self::add_word) and
/// [`remove_word`](Self::remove_word).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordLanguageModel {
    params: ModelParams,
    chars: CharacterModel,
    counts: HashMap<String, u64>,
    num_words: u64,
}

impl WordLanguageModel {
    /// Creates an empty model.
    ///
    /// # Arguments
    /// * `chars` - Character emission probabilities used by the word prior.
    /// * `params` - Smoothing strength, maximum word length and mean word length.
    ///
    /// # Errors
    /// Returns an error if `params` fails validation.
    pub fn new(chars: CharacterModel, params: ModelParams) -> Result<Self> {
        params.validate()?;
        Ok(WordLanguageModel {
            params,
            chars,
            counts: HashMap::new(),
            num_words: 0,
        })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn character_model(&self) -> &CharacterModel {
        &self.chars
    }

    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Total number of word occurrences currently registered.
    pub fn num_words(&self) -> u64 {
        self.num_words
    }

    /// Number of distinct words with a positive count.
    pub fn vocabulary_size(&self) -> usize {
        self.counts.len()
    }

    /// Iterates over every known word and its count, in no particular order.
    pub fn words(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(w, &n)| (w.as_str(), n))
    }

    pub fn add_word(&mut self, word: &str) {
        match self.counts.get_mut(word) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(word.to_string(), 1);
            }
        }
        self.num_words += 1;
    }

    /// Retracts one occurrence of `word`.
    ///
    /// # Errors
    /// Returns [`SegmentError::InconsistentModelState`] if `word` has no
    /// occurrence left; the model is left untouched in that case.
    pub fn remove_word(&mut self, word: &str) -> Result<()> {
        let n = self
            .counts
            .get_mut(word)
            .ok_or_else(|| SegmentError::InconsistentModelState {
                word: word.to_string(),
            })?;
        *n -= 1;
        if *n == 0 {
            self.counts.remove(word);
        }
        self.num_words -= 1;
        Ok(())
    }

    /// Generative prior of a word: the product of its character
    /// probabilities times a Poisson probability of its length.
    pub fn prior(&self, word: &str) -> f64 {
        let mut prior = 1.0;
        let mut len = 0usize;
        for ch in word.chars() {
            prior *= self.chars.probability(ch);
            len += 1;
        }
        prior * poisson_pmf(len, self.params.mean_len)
    }

    /// Smoothed probability `(count(w) + alpha * prior(w)) / (N + alpha)`.
    pub fn output_probability(&self, word: &str) -> f64 {
        let alpha = self.params.alpha;
        (self.count(word) as f64 + alpha * self.prior(word)) / (self.num_words as f64 + alpha)
    }

    /// Natural logarithm of [`output_probability`](Self::output_probability).
    /// Returns negative infinity for words the model gives no mass to.
    pub fn log_output_probability(&self, word: &str) -> f64 {
        self.output_probability(word).ln()
    }

    /// Writes the model as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a model previously written by [`save`](Self::save).
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// carries invalid parameters or a word total that does not match its counts.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: WordLanguageModel = serde_json::from_reader(reader)?;
        model.params.validate()?;
        let sum: u64 = model.counts.values().sum();
        if sum != model.num_words {
            return Err(SegmentError::malformed(format!(
                "model declares {} words but its counts sum to {}",
                model.num_words, sum
            )));
        }
        Ok(model)
    }
}

fn poisson_pmf(k: usize, lambda: f64) -> f64 {
    let log_factorial: f64 = (2..=k).map(|i| (i as f64).ln()).sum();
    (k as f64 * lambda.ln() - lambda - log_factorial).exp()
}
