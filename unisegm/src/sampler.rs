use rand::Rng;

use crate::errors::{Result, SegmentError};
use crate::lattice::Lattice;
use crate::sentence::Sentence;

/// Draws an index with probability proportional to its weight.
///
/// Weights need not be normalized. A uniform value `u` is drawn from
/// `[0, total)` and the first index with positive weight whose cumulative
/// sum reaches `u` is returned, so a draw landing exactly on a boundary
/// goes to the lower index.
///
/// # Errors
/// Returns [`SegmentError::DegenerateSampling`] if the weights sum to zero,
/// and [`SegmentError::InvalidArgument`] if any weight is negative or not finite.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
        return Err(SegmentError::invalid_argument(format!("invalid sampling weight {}", w)));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(SegmentError::DegenerateSampling);
    }

    let u = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = i;
        if cumulative >= u {
            return Ok(i);
        }
    }
    // Rounding can leave the running sum a hair below `u`.
    Ok(last_positive)
}

/// Draws one segmentation of `sentence` from a completed forward lattice.
///
/// Walks from the last character back to the first, picking the length of
/// each word in proportion to the forward mass of the cells at the current
/// position. The returned words are in left-to-right order and concatenate
/// to the sentence.
///
/// # Errors
/// Returns [`SegmentError::MalformedInput`] if the lattice was built for a
/// sentence of a different length, and [`SegmentError::DegenerateSampling`]
/// if some position carries no forward mass at all.
pub fn backward_sample<R: Rng + ?Sized>(
    lattice: &Lattice,
    sentence: &Sentence,
    rng: &mut R,
) -> Result<Vec<String>> {
    if lattice.len() != sentence.len() || sentence.is_empty() {
        return Err(SegmentError::malformed(format!(
            "lattice covers {} characters but the sentence has {}",
            lattice.len(),
            sentence.len()
        )));
    }

    let mut words = Vec::new();
    let mut weights = vec![0.0; lattice.max_len()];
    let mut end = sentence.len();
    while end > 0 {
        let row = lattice.row(end - 1);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            return Err(SegmentError::DegenerateSampling);
        }
        for (w, &l) in weights.iter_mut().zip(row) {
            *w = (l - max).exp();
        }

        let k = sample_index(&weights, rng)? + 1;
        let start = end - k;
        words.push(sentence.slice(start, end).to_string());
        end = start;
    }
    words.reverse();

    Ok(words)
}
