//! Per-hand recognizers.
//!
//! A [`HandClassifier`] turns the first hand of a frame into at most one
//! candidate. The session votes on whatever it returns, so recognizers are
//! interchangeable.

use std::sync::Arc;

use handsign_common::config::RecognizerKind;
use handsign_sign_model::dictionary::SignDictionary;
use handsign_sign_model::landmark::{Hand, FINGERTIPS, FINGER_BASES, THUMB_IP, THUMB_TIP};
use handsign_sign_model::sign::Candidate;

use crate::features::{normalize, FeatureExtractor};
use crate::matcher::{SignMatcher, SimilarityMatcher};

/// Trait for per-hand recognizers.
pub trait HandClassifier: Send {
    /// Candidate for this hand, or `None` when the hand is malformed or
    /// nothing is recognized.
    fn classify(&self, hand: &Hand) -> Option<Candidate>;

    /// Classifier name for logging.
    fn name(&self) -> &str;
}

/// Build the classifier selected in configuration.
pub fn classifier_for(
    kind: RecognizerKind,
    dictionary: Arc<SignDictionary>,
    confidence_threshold: f64,
) -> Box<dyn HandClassifier> {
    match kind {
        RecognizerKind::Similarity => Box::new(DictionaryClassifier::new(
            dictionary,
            Box::new(SimilarityMatcher::new(confidence_threshold)),
        )),
        RecognizerKind::FingerCount => Box::new(FingerCountClassifier::new()),
    }
}

/// Extract → normalize → match against the sign dictionary.
pub struct DictionaryClassifier {
    dictionary: Arc<SignDictionary>,
    extractor: FeatureExtractor,
    matcher: Box<dyn SignMatcher>,
}

impl DictionaryClassifier {
    pub fn new(dictionary: Arc<SignDictionary>, matcher: Box<dyn SignMatcher>) -> Self {
        Self {
            dictionary,
            extractor: FeatureExtractor::new(),
            matcher,
        }
    }

    pub fn dictionary(&self) -> &SignDictionary {
        &self.dictionary
    }
}

impl HandClassifier for DictionaryClassifier {
    fn classify(&self, hand: &Hand) -> Option<Candidate> {
        let features = normalize(&self.extractor.extract(hand)?);
        self.matcher.best_match(&features, &self.dictionary)
    }

    fn name(&self) -> &str {
        self.matcher.name()
    }
}

/// Fixed confidence reported by [`FingerCountClassifier`].
pub const FINGER_COUNT_CONFIDENCE: f64 = 0.8;

/// Sign ids by number of extended digits.
pub const FINGER_COUNT_SIGNS: [&str; 6] = ["FIST", "ONE", "TWO", "THREE", "FOUR", "FIVE"];

/// Rule-based recognizer that counts extended digits.
///
/// A finger is extended when its tip sits above its second joint (smaller
/// `y`, image coordinates). The thumb is extended when its tip lies right of
/// its IP joint. The count maps to [`FINGER_COUNT_SIGNS`]; no dictionary is
/// involved.
#[derive(Debug, Clone, Copy)]
pub struct FingerCountClassifier {
    confidence: f64,
}

impl FingerCountClassifier {
    pub fn new() -> Self {
        Self {
            confidence: FINGER_COUNT_CONFIDENCE,
        }
    }

    /// Extended digits, thumb included, in `0..=5`. `None` when malformed.
    pub fn extended_count(hand: &Hand) -> Option<usize> {
        if !hand.is_well_formed() {
            return None;
        }

        let mut count = 0;
        for (&tip, &joint) in FINGERTIPS[1..].iter().zip(&FINGER_BASES[1..]) {
            if hand.point(tip)?.y < hand.point(joint)?.y {
                count += 1;
            }
        }
        if hand.point(THUMB_TIP)?.x > hand.point(THUMB_IP)?.x {
            count += 1;
        }
        Some(count)
    }
}

impl Default for FingerCountClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HandClassifier for FingerCountClassifier {
    fn classify(&self, hand: &Hand) -> Option<Candidate> {
        let count = Self::extended_count(hand)?;
        let id = FINGER_COUNT_SIGNS.get(count)?;
        Some(Candidate::new(*id, *id, self.confidence))
    }

    fn name(&self) -> &str {
        "finger_count"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handsign_sign_model::landmark::{Point2D, LANDMARK_COUNT};

    /// Upright hand with every finger curled and the thumb tucked left.
    fn fist() -> Vec<Point2D> {
        let mut points = vec![Point2D::new(0.5, 0.5); LANDMARK_COUNT];
        for (&tip, &joint) in FINGERTIPS[1..].iter().zip(&FINGER_BASES[1..]) {
            points[joint] = Point2D::new(0.5, 0.4);
            points[tip] = Point2D::new(0.5, 0.45);
        }
        points[THUMB_IP] = Point2D::new(0.45, 0.5);
        points[THUMB_TIP] = Point2D::new(0.43, 0.5);
        points
    }

    fn extend(points: &mut [Point2D], finger: usize) {
        let tip = FINGERTIPS[finger];
        if finger == 0 {
            points[tip] = Point2D::new(0.6, 0.5);
        } else {
            points[tip] = Point2D::new(0.5, 0.2);
        }
    }

    #[test]
    fn test_fist_counts_zero() {
        let hand = Hand::new(fist());
        assert_eq!(FingerCountClassifier::extended_count(&hand), Some(0));
        let candidate = FingerCountClassifier::new().classify(&hand).unwrap();
        assert_eq!(candidate.sign_id, "FIST");
        assert!((candidate.confidence - FINGER_COUNT_CONFIDENCE).abs() < 1e-12);
    }

    #[test]
    fn test_each_extended_digit_counts_once() {
        let mut points = fist();
        for (finger, expected) in [(1, "ONE"), (2, "TWO"), (3, "THREE"), (4, "FOUR"), (0, "FIVE")] {
            extend(&mut points, finger);
            let candidate = FingerCountClassifier::new()
                .classify(&Hand::new(points.clone()))
                .unwrap();
            assert_eq!(candidate.sign_id, expected);
            assert_eq!(candidate.name, expected);
        }
    }

    #[test]
    fn test_thumb_alone_counts_as_one() {
        let mut points = fist();
        extend(&mut points, 0);
        assert_eq!(
            FingerCountClassifier::extended_count(&Hand::new(points)),
            Some(1)
        );
    }

    #[test]
    fn test_tip_level_with_joint_is_not_extended() {
        let mut points = fist();
        points[FINGERTIPS[1]] = points[FINGER_BASES[1]];
        assert_eq!(
            FingerCountClassifier::extended_count(&Hand::new(points)),
            Some(0)
        );
    }

    #[test]
    fn test_malformed_hand_is_none() {
        let hand = Hand::new(fist()[..20].to_vec());
        assert_eq!(FingerCountClassifier::extended_count(&hand), None);
        assert!(FingerCountClassifier::new().classify(&hand).is_none());
    }

    #[test]
    fn test_classifier_for_selects_by_kind() {
        let dictionary = Arc::new(SignDictionary::builtin().unwrap());
        let similarity = classifier_for(RecognizerKind::Similarity, dictionary.clone(), 0.75);
        assert_eq!(similarity.name(), "similarity");
        let fingers = classifier_for(RecognizerKind::FingerCount, dictionary, 0.75);
        assert_eq!(fingers.name(), "finger_count");
        assert_eq!(fingers.classify(&Hand::new(fist())).unwrap().sign_id, "FIST");
    }

    #[test]
    fn test_dictionary_classifier_rejects_malformed_hand() {
        let dictionary = Arc::new(SignDictionary::builtin().unwrap());
        let classifier =
            DictionaryClassifier::new(dictionary, Box::new(SimilarityMatcher::new(0.0)));
        assert!(classifier.classify(&Hand::new(vec![])).is_none());
        assert!(!classifier.dictionary().is_empty());
    }
}
