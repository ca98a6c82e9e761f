//! Edit-distance similarity for near-duplicate flagging.
//!
//! Scores are advisory: only exact fingerprint equality ever decides that two
//! records are the same. A high score means "a human should look at this".

use crate::{Error, Result, text::normalize};

/// Threshold used when the caller does not pick one.
pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// Range the threshold is expected to sit in. Values outside it are accepted
/// but usually produce either noise or nothing.
pub const RECOMMENDED_THRESHOLD: std::ops::RangeInclusive<f64> = 0.85..=0.95;

/// Similarity of `a` and `b` in `[0.0, 1.0]` after normalisation.
///
/// `1 - levenshtein(a', b') / max(len(a'), len(b'))`, measured in Unicode
/// scalar values. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
  let a: Vec<char> = normalize(a).chars().collect();
  let b: Vec<char> = normalize(b).chars().collect();

  let longest = a.len().max(b.len());
  if longest == 0 {
    return 1.0;
  }
  1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Check a caller-supplied threshold. Zero would flag everything.
pub fn validate_threshold(threshold: f64) -> Result<f64> {
  if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
    Ok(threshold)
  } else {
    Err(Error::InvalidThreshold(threshold))
  }
}

/// Classic two-row Levenshtein distance.
fn levenshtein(a: &[char], b: &[char]) -> usize {
  if a.is_empty() {
    return b.len();
  }
  if b.is_empty() {
    return a.len();
  }

  let mut previous: Vec<usize> = (0..=b.len()).collect();
  let mut current = vec![0; b.len() + 1];

  for (i, ca) in a.iter().enumerate() {
    current[0] = i + 1;
    for (j, cb) in b.iter().enumerate() {
      let substitution = previous[j] + usize::from(ca != cb);
      let deletion = previous[j + 1] + 1;
      let insertion = current[j] + 1;
      current[j + 1] = substitution.min(deletion).min(insertion);
    }
    std::mem::swap(&mut previous, &mut current);
  }

  previous[b.len()]
}
