//! Scoring normalized features against the sign dictionary.
//!
//! [`SignMatcher`] is the seam a trained classifier plugs into. Any
//! implementation must be pure and deterministic, and must return
//! confidences in (0, 1].

use handsign_sign_model::dictionary::SignDictionary;
use handsign_sign_model::sign::{Candidate, SignEntry};

use crate::features::FeatureVector;

/// Default minimum similarity a candidate must exceed.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Trait for sign scorers.
pub trait SignMatcher: Send {
    /// Best dictionary entry for these features, or `None` when nothing
    /// scores above the matcher's threshold.
    fn best_match(&self, features: &FeatureVector, dictionary: &SignDictionary)
        -> Option<Candidate>;

    /// Matcher name for logging.
    fn name(&self) -> &str;
}

/// Distance-based similarity against each entry's reference pattern.
///
/// Feature `i` is compared with `pattern[i].x` and feature `i + 1` with
/// `pattern[i].y`, so consecutive pairs overlap. Each pair contributes
/// `1 / (1 + distance)` and the score is the mean over
/// `min(features.len() - 1, pattern.len())` pairs.
#[derive(Debug, Clone)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Similarity of a feature vector to one reference pattern, in [0, 1].
    ///
    /// Zero when there is nothing to compare (empty pattern, or fewer than
    /// two features).
    pub fn similarity(features: &[f64], pattern: &[(f64, f64)]) -> f64 {
        let pairs = features.len().saturating_sub(1).min(pattern.len());
        if pairs == 0 {
            return 0.0;
        }

        let total: f64 = pattern[..pairs]
            .iter()
            .zip(features.windows(2))
            .map(|(&(px, py), w)| {
                let distance = (w[0] - px).hypot(w[1] - py);
                1.0 / (1.0 + distance)
            })
            .sum();

        total / pairs as f64
    }

    /// Highest-scoring entry regardless of threshold.
    ///
    /// Ties keep the earliest entry in dictionary order. Entries scoring
    /// zero are never selected.
    pub fn best_scored<'a>(
        &self,
        features: &FeatureVector,
        dictionary: &'a SignDictionary,
    ) -> Option<(&'a SignEntry, f64)> {
        let mut best: Option<(&SignEntry, f64)> = None;
        for entry in dictionary {
            let score = Self::similarity(features.values(), &entry.reference_pattern);
            let best_score = best.map_or(0.0, |(_, s)| s);
            if score > best_score {
                best = Some((entry, score));
            }
        }
        best
    }
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl SignMatcher for SimilarityMatcher {
    fn best_match(
        &self,
        features: &FeatureVector,
        dictionary: &SignDictionary,
    ) -> Option<Candidate> {
        let (entry, score) = self.best_scored(features, dictionary)?;
        if score > self.threshold {
            Some(Candidate::from_entry(entry, score))
        } else {
            tracing::trace!(sign = %entry.id, score, "Best match below threshold");
            None
        }
    }

    fn name(&self) -> &str {
        "similarity"
    }
}
