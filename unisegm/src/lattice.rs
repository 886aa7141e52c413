use crate::errors::{Result, SegmentError};
use crate::language_model::WordLanguageModel;
use crate::sentence::Sentence;

/// Forward probabilities over every segmentation of one sentence.
///
/// Cell `(t, k)` holds the mass of all segmentations of the prefix ending
/// at character `t` whose last word has length `k`. Values are kept in log
/// space; cells with `k > t + 1` are never reachable and read as zero.
#[derive(Debug, Clone)]
pub struct Lattice {
    len: usize,
    // Row width: the model's longest word, capped by the sentence length.
    max_len: usize,
    // Row-major, `max_len` cells per position; column `k - 1` holds length `k`.
    log_alpha: Vec<f64>,
    // Log of the sum of each row.
    log_totals: Vec<f64>,
}

impl Lattice {
    /// Runs the forward pass of `sentence` against `model`.
    ///
    /// For every end position `t` and word length `k`, the word ending at `t`
    /// is scored by the model and multiplied by the total mass reaching the
    /// position right before it.
    ///
    /// # Errors
    /// Returns [`SegmentError::MalformedInput`] if the sentence is empty.
    pub fn forward(sentence: &Sentence, model: &WordLanguageModel) -> Result<Self> {
        if sentence.is_empty() {
            return Err(SegmentError::malformed("cannot build a lattice for an empty sentence"));
        }

        let len = sentence.len();
        let max_len = model.params().max_len.min(len);
        let mut lattice = Lattice {
            len,
            max_len,
            log_alpha: vec![f64::NEG_INFINITY; len * max_len],
            log_totals: vec![f64::NEG_INFINITY; len],
        };

        for t in 0..len {
            for k in 1..=max_len.min(t + 1) {
                let word = sentence.slice(t + 1 - k, t + 1);
                let out = model.log_output_probability(word);
                // The word starts at t + 1 - k; t - k is the last char before it.
                let prev = if t >= k { lattice.log_totals[t - k] } else { 0.0 };
                lattice.log_alpha[t * max_len + k - 1] = out + prev;
            }
            let total = log_sum_exp(lattice.row(t));
            lattice.log_totals[t] = total;
        }

        Ok(lattice)
    }

    /// Number of positions, i.e. the sentence length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Longest word length a row holds.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Log forward values at position `t`, indexed by `k - 1`.
    pub fn row(&self, t: usize) -> &[f64] {
        &self.log_alpha[t * self.max_len..(t + 1) * self.max_len]
    }

    /// Log forward value of cell `(t, k)`; negative infinity outside the lattice.
    pub fn log_weight(&self, t: usize, k: usize) -> f64 {
        if t >= self.len || k == 0 || k > self.max_len {
            return f64::NEG_INFINITY;
        }
        self.log_alpha[t * self.max_len + k - 1]
    }

    /// Linear-scale forward value of cell `(t, k)`.
    pub fn weight(&self, t: usize, k: usize) -> f64 {
        self.log_weight(t, k).exp()
    }

    /// Log of the total mass over all segmentations of the whole sentence.
    pub fn log_evidence(&self) -> f64 {
        self.log_totals[self.len - 1]
    }
}

/// `ln(sum(exp(x)))` without overflowing or underflowing.
pub(crate) fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::character_model::CharacterModel;
    use crate::language_model::ModelParams;

    fn trained_model(corpus: &[&str], words: &[&str]) -> WordLanguageModel {
        let mut model = WordLanguageModel::new(
            CharacterModel::from_corpus(corpus.iter().copied()),
            ModelParams::default(),
        )
        .unwrap();
        for w in words {
            model.add_word(w);
        }
        model
    }

    // Sum over every segmentation of the product of its word probabilities.
    fn brute_force(sentence: &Sentence, model: &WordLanguageModel, start: usize) -> f64 {
        if start == sentence.len() {
            return 1.0;
        }
        let max_len = model.params().max_len;
        (1..=max_len.min(sentence.len() - start))
            .map(|k| {
                model.output_probability(sentence.slice(start, start + k))
                    * brute_force(sentence, model, start + k)
            })
            .sum()
    }

    #[test]
    fn test_matches_enumeration() {
        let model = trained_model(&["abcabc", "abab"], &["ab", "ab", "c", "abc", "b", "a"]);

        for text in ["a", "ab", "abc", "abca", "abcab", "abcabc", "bbbaab"] {
            let sentence = Sentence::new(text);
            let lattice = Lattice::forward(&sentence, &model).unwrap();
            let expected = brute_force(&sentence, &model, 0);
            let actual: f64 = (1..=5).map(|k| lattice.weight(sentence.len() - 1, k)).sum();

            assert!(
                (actual - expected).abs() <= expected * 1e-9,
                "{}: {} != {}",
                text,
                actual,
                expected
            );
            assert!((lattice.log_evidence() - expected.ln()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_first_row() {
        let model = trained_model(&["abab"], &["a"]);
        let sentence = Sentence::new("abab");
        let lattice = Lattice::forward(&sentence, &model).unwrap();

        assert!((lattice.weight(0, 1) - model.output_probability("a")).abs() < 1e-12);
        for k in 2..=5 {
            assert_eq!(lattice.weight(0, k), 0.0);
        }
        assert!((lattice.weight(1, 2) - model.output_probability("ab")).abs() < 1e-12);
        let expected = model.output_probability("a") * model.output_probability("b");
        assert!((lattice.weight(1, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_cells_are_zero() {
        let model = trained_model(&["abc"], &[]);
        let lattice = Lattice::forward(&Sentence::new("abc"), &model).unwrap();

        assert_eq!(lattice.weight(1, 3), 0.0);
        assert_eq!(lattice.weight(2, 4), 0.0);
        assert_eq!(lattice.weight(2, 6), 0.0);
        assert_eq!(lattice.weight(3, 1), 0.0);
    }

    #[test]
    fn test_long_sentence_does_not_underflow() {
        let text = "abcdefghij".repeat(60);
        let model = trained_model(&[text.as_str()], &[]);
        let lattice = Lattice::forward(&Sentence::new(text.as_str()), &model).unwrap();

        assert!(lattice.log_evidence().is_finite());
    }

    #[test]
    fn test_row_width_capped_by_sentence() {
        let params = ModelParams {
            max_len: 1_000_000,
            ..ModelParams::default()
        };
        let model =
            WordLanguageModel::new(CharacterModel::from_corpus(["abc"]), params).unwrap();
        let sentence = Sentence::new("abc");
        let lattice = Lattice::forward(&sentence, &model).unwrap();

        assert_eq!(lattice.max_len(), 3);
        assert_eq!(lattice.row(2).len(), 3);
        assert!((lattice.weight(2, 3) - model.output_probability("abc")).abs() < 1e-12);
        assert_eq!(lattice.weight(2, 4), 0.0);
    }

    #[test]
    fn test_empty_sentence() {
        let model = trained_model(&["a"], &[]);
        assert!(matches!(
            Lattice::forward(&Sentence::new(""), &model),
            Err(SegmentError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_log_sum_exp() {
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), f64::NEG_INFINITY);
        assert!((log_sum_exp(&[0.0, 0.0]) - 2.0f64.ln()).abs() < 1e-12);
        assert!((log_sum_exp(&[-1000.0, -1000.0]) - (-1000.0 + 2.0f64.ln())).abs() < 1e-9);
    }
}
