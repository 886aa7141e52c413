use crate::language_model::WordLanguageModel;
use crate::sentence::Sentence;

/// Log score of a single character the model gives no mass to.
/// Far below any word built from known characters, but finite so that
/// every input still has a covering segmentation.
pub const UNKNOWN_CHAR_LOG_PROB: f64 = -100.0;

/// Segmenter struct for splitting text with a trained word model.
/// Unlike the trainer, it does not sample: it returns the single most
/// probable segmentation under the unigram model.
pub struct Segmenter {
    pub model: WordLanguageModel,
}

impl Segmenter {
    /// Creates a new instance of [`Segmenter`].
    ///
    /// # Example
    /// ```
    /// use unisegm::character_model::CharacterModel;
    /// use unisegm::language_model::{ModelParams, WordLanguageModel};
    /// use unisegm::segmenter::Segmenter;
    ///
    /// let chars = CharacterModel::from_corpus(["abab"]);
    /// let mut model = WordLanguageModel::new(chars, ModelParams::default()).unwrap();
    /// for _ in 0..10 {
    ///     model.add_word("ab");
    /// }
    ///
    /// let segmenter = Segmenter::new(model);
    /// assert_eq!(segmenter.segment("ababab"), vec!["ab", "ab", "ab"]);
    /// ```
    pub fn new(model: WordLanguageModel) -> Self {
        Segmenter { model }
    }

    /// Segments a sentence into words.
    ///
    /// # Returns
    /// The words of the highest-scoring segmentation, left to right.
    /// An empty sentence yields an empty vector. A character never seen in
    /// training becomes a word of its own.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let sentence = Sentence::new(text);
        if sentence.is_empty() {
            return Vec::new();
        }

        let len = sentence.len();
        let max_len = self.model.params().max_len;
        // best[t]: best log score of the prefix of length t; back[t]: length of its last word.
        let mut best = vec![f64::NEG_INFINITY; len + 1];
        let mut back = vec![0usize; len + 1];
        best[0] = 0.0;

        for end in 1..=len {
            for k in 1..=max_len.min(end) {
                let prev = best[end - k];
                if prev == f64::NEG_INFINITY {
                    continue;
                }
                let mut out = self.model.log_output_probability(sentence.slice(end - k, end));
                if k == 1 && out == f64::NEG_INFINITY {
                    out = UNKNOWN_CHAR_LOG_PROB;
                }
                let score = prev + out;
                if score > best[end] {
                    best[end] = score;
                    back[end] = k;
                }
            }
        }

        let mut words = Vec::new();
        let mut end = len;
        while end > 0 {
            let start = end - back[end];
            words.push(sentence.slice(start, end).to_string());
            end = start;
        }
        words.reverse();

        words
    }
}
