use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rand::Rng;

use crate::character_model::CharacterModel;
use crate::errors::{Result, SegmentError};
use crate::language_model::{ModelParams, WordLanguageModel};
use crate::lattice::Lattice;
use crate::sampler::backward_sample;
use crate::sentence::Sentence;

/// Trainer struct for learning a segmentation of a whole corpus.
/// It keeps one segmentation per sentence and a single shared word model,
/// and refines both by resampling each sentence in turn against the counts
/// of every other sentence.
pub struct Trainer<R> {
    sentences: Vec<Sentence>,
    segmentations: Vec<Vec<String>>,
    model: WordLanguageModel,
    rng: R,
}

impl<R: Rng> Trainer<R> {
    /// Creates a new instance of [`Trainer`].
    ///
    /// The character model is estimated from `corpus`. No sentence is
    /// segmented yet; call [`initialize`](Self::initialize) before training.
    ///
    /// # Arguments
    /// * `corpus` - The sentences to segment, in training order.
    /// * `params` - Hyperparameters of the word model.
    /// * `rng` - Source of randomness for initialization and sampling.
    ///
    /// # Errors
    /// Returns an error if a sentence is empty or `params` is invalid.
    pub fn new<I, S>(corpus: I, params: ModelParams, rng: R) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sentences: Vec<Sentence> = corpus.into_iter().map(Sentence::new).collect();
        if let Some(i) = sentences.iter().position(Sentence::is_empty) {
            return Err(SegmentError::malformed(format!("sentence {} is empty", i)));
        }

        let chars = CharacterModel::from_corpus(sentences.iter().map(Sentence::as_str));
        let model = WordLanguageModel::new(chars, params)?;
        let segmentations = vec![Vec::new(); sentences.len()];

        Ok(Trainer {
            sentences,
            segmentations,
            model,
            rng,
        })
    }

    /// Cuts every sentence at random into words of at most `max_len`
    /// characters and registers those words in the model.
    ///
    /// Any segmentation left from an earlier call is retracted first.
    pub fn initialize(&mut self) -> Result<()> {
        let max_len = self.model.params().max_len;

        for (sentence, words) in self.sentences.iter().zip(self.segmentations.iter_mut()) {
            for w in words.drain(..) {
                self.model.remove_word(&w)?;
            }

            let mut start = 0;
            while start < sentence.len() {
                let len = self.rng.random_range(1..=max_len).min(sentence.len() - start);
                words.push(sentence.slice(start, start + len).to_string());
                start += len;
            }
            for w in words.iter() {
                self.model.add_word(w);
            }
        }

        debug!(
            "initialized {} sentences: {} words, {} distinct",
            self.sentences.len(),
            self.model.num_words(),
            self.model.vocabulary_size()
        );
        Ok(())
    }

    /// Runs one sweep over the corpus.
    ///
    /// Each sentence has its current words removed from the model, is
    /// resampled against the remaining counts, and has its new words added
    /// back before the next sentence is processed.
    ///
    /// # Errors
    /// Any error aborts the sweep. The sentence being processed keeps its
    /// words retracted, so the trainer should be discarded afterwards.
    pub fn iterate(&mut self) -> Result<()> {
        for (sentence, words) in self.sentences.iter().zip(self.segmentations.iter_mut()) {
            for w in words.iter() {
                self.model.remove_word(w)?;
            }

            let lattice = Lattice::forward(sentence, &self.model)?;
            *words = backward_sample(&lattice, sentence, &mut self.rng)?;

            for w in words.iter() {
                self.model.add_word(w);
            }
        }
        Ok(())
    }

    /// Runs up to `epochs` sweeps.
    ///
    /// # Arguments
    /// * `epochs` - The number of sweeps to run.
    /// * `running` - Checked before each sweep; training stops early once it is `false`.
    ///
    /// # Returns
    /// The corpus log-likelihood after each completed sweep.
    pub fn train(&mut self, epochs: usize, running: &AtomicBool) -> Result<Vec<f64>> {
        let mut trace = Vec::with_capacity(epochs);

        for epoch in 0..epochs {
            if !running.load(Ordering::SeqCst) {
                warn!("training interrupted after {} of {} epochs", epoch, epochs);
                break;
            }

            self.iterate()?;

            let log_likelihood = self.log_likelihood();
            info!(
                "epoch {} - log-likelihood: {:.4}, vocabulary: {}",
                epoch + 1,
                log_likelihood,
                self.model.vocabulary_size()
            );
            trace.push(log_likelihood);
        }

        Ok(trace)
    }
}

impl<R> Trainer<R> {
    /// Sum of the log output probability of every word of every current
    /// segmentation under the model.
    pub fn log_likelihood(&self) -> f64 {
        self.segmentations
            .iter()
            .flatten()
            .map(|w| self.model.log_output_probability(w))
            .sum()
    }

    pub fn model(&self) -> &WordLanguageModel {
        &self.model
    }

    pub fn into_model(self) -> WordLanguageModel {
        self.model
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Current segmentation of every sentence, in corpus order.
    pub fn segmentations(&self) -> &[Vec<String>] {
        &self.segmentations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts_are_consistent<R>(trainer: &Trainer<R>) -> bool {
        let model = trainer.model();
        let sum: u64 = model.words().map(|(_, n)| n).sum();
        let words = trainer.segmentations().iter().map(Vec::len).sum::<usize>() as u64;
        sum == model.num_words() && words == model.num_words()
    }

    fn covers_corpus<R>(trainer: &Trainer<R>) -> bool {
        trainer
            .sentences()
            .iter()
            .zip(trainer.segmentations())
            .all(|(s, words)| words.concat() == s.as_str())
    }

    #[test]
    fn test_new_rejects_empty_sentence() {
        let result = Trainer::new(["ab", "", "c"], ModelParams::default(), StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(SegmentError::MalformedInput(_))));
    }

    #[test]
    fn test_initialize() -> Result<()> {
        let corpus = ["あいうえおかきくけこ", "abcabcabcabc", "x"];
        let mut trainer = Trainer::new(corpus, ModelParams::default(), StdRng::seed_from_u64(5))?;
        trainer.initialize()?;

        assert!(covers_corpus(&trainer));
        assert!(counts_are_consistent(&trainer));
        for words in trainer.segmentations() {
            assert!(words.iter().all(|w| (1..=5).contains(&w.chars().count())));
        }

        // Re-initializing replaces the previous segmentation instead of stacking on it.
        trainer.initialize()?;
        assert!(counts_are_consistent(&trainer));
        Ok(())
    }

    #[test]
    fn test_iterate_keeps_invariants() -> Result<()> {
        let corpus = ["abcabcab", "cabcab", "すもももももももものうち", "a"];
        let mut trainer = Trainer::new(corpus, ModelParams::default(), StdRng::seed_from_u64(9))?;
        trainer.initialize()?;

        for _ in 0..20 {
            trainer.iterate()?;
            assert!(covers_corpus(&trainer));
            assert!(counts_are_consistent(&trainer));
        }
        Ok(())
    }

    #[test]
    fn test_train_stops_when_not_running() -> Result<()> {
        let mut trainer = Trainer::new(["abab"], ModelParams::default(), StdRng::seed_from_u64(1))?;
        trainer.initialize()?;
        let before = trainer.segmentations().to_vec();

        let running = AtomicBool::new(false);
        let trace = trainer.train(10, &running)?;

        assert!(trace.is_empty());
        assert_eq!(trainer.segmentations(), before.as_slice());
        Ok(())
    }

    #[test]
    fn test_train_returns_trace() -> Result<()> {
        let mut trainer = Trainer::new(["abab", "baba"], ModelParams::default(), StdRng::seed_from_u64(1))?;
        trainer.initialize()?;

        let running = AtomicBool::new(true);
        let trace = trainer.train(5, &running)?;

        assert_eq!(trace.len(), 5);
        assert!(trace.iter().all(|ll| ll.is_finite() && *ll < 0.0));
        assert!((trace[4] - trainer.log_likelihood()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_into_model_keeps_learned_counts() -> Result<()> {
        let mut trainer = Trainer::new(["abab", "abba"], ModelParams::default(), StdRng::seed_from_u64(4))?;
        trainer.initialize()?;
        trainer.train(3, &AtomicBool::new(true))?;

        let words: Vec<String> = trainer.segmentations().iter().flatten().cloned().collect();
        let model = trainer.into_model();

        assert_eq!(model.num_words(), words.len() as u64);
        for w in &words {
            assert!(model.count(w) >= 1);
        }
        Ok(())
    }

    #[test]
    fn test_same_seed_same_result() -> Result<()> {
        let corpus = ["abcabcab", "cabcab", "bcabca"];
        let run = |seed| -> Result<Vec<Vec<String>>> {
            let mut trainer = Trainer::new(corpus, ModelParams::default(), StdRng::seed_from_u64(seed))?;
            trainer.initialize()?;
            trainer.train(10, &AtomicBool::new(true))?;
            Ok(trainer.segmentations().to_vec())
        };

        assert_eq!(run(123)?, run(123)?);
        Ok(())
    }

    #[test]
    fn test_single_sentence_samples_from_prior() -> Result<()> {
        // With a single sentence every sweep retracts all counts, so each
        // draw comes from the prior alone. For "abab" the exact probability
        // of a segmentation containing "ab" is about 0.346.
        let mut trainer = Trainer::new(["abab"], ModelParams::default(), StdRng::seed_from_u64(2024))?;
        trainer.initialize()?;

        let sweeps = 4000;
        let mut with_ab = 0;
        for _ in 0..sweeps {
            trainer.iterate()?;
            if trainer.model().count("ab") >= 1 {
                with_ab += 1;
            }
        }

        let freq = with_ab as f64 / sweeps as f64;
        assert!((freq - 0.346).abs() < 0.04, "frequency {}", freq);
        Ok(())
    }

    #[test]
    fn test_log_likelihood_improves() -> Result<()> {
        let corpus: Vec<String> = (0..30)
            .map(|i| if i % 2 == 0 { "abcabcabc" } else { "abcxyabc" }.to_string())
            .collect();
        let mut trainer = Trainer::new(corpus, ModelParams::default(), StdRng::seed_from_u64(77))?;
        trainer.initialize()?;
        let initial = trainer.log_likelihood();

        let trace = trainer.train(30, &AtomicBool::new(true))?;
        let tail: f64 = trace[20..].iter().sum::<f64>() / 10.0;

        assert!(tail > initial, "{} <= {}", tail, initial);
        Ok(())
    }
}
