//! Approximate string similarity on a 0–100 scale.
//!
//! The matcher depends only on the [`Similarity`] trait so the scoring
//! function can be swapped (or stubbed in tests).

/// Scores how closely `a` resembles `b`, from 0 (unrelated) to 100
/// (identical for matching purposes).
pub trait Similarity: Send + Sync {
  fn score(&self, a: &str, b: &str) -> u8;
}

impl<F> Similarity for F
where
  F: Fn(&str, &str) -> u8 + Send + Sync,
{
  fn score(&self, a: &str, b: &str) -> u8 { self(a, b) }
}

/// Case-insensitive partial ratio: the best normalized Levenshtein
/// similarity between the shorter string and any equally long window of the
/// longer one. A short query fully contained in a long title scores 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl Similarity for PartialRatio {
  fn score(&self, a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
      return 0;
    }

    let needle: String = short.iter().collect();
    let best = long
      .windows(short.len())
      .map(|window| {
        let window: String = window.iter().collect();
        strsim::normalized_levenshtein(&needle, &window)
      })
      .fold(0.0_f64, f64::max);

    (best * 100.0).round().clamp(0.0, 100.0) as u8
  }
}
