//! Hand feature extraction and normalization.
//!
//! The reference layout is 25 values, always in this order:
//!
//! | Range    | Content |
//! |----------|---------|
//! | `0..15`  | pairwise distances among wrist + 5 fingertips, lexicographic index pairs `(0,4) (0,8) … (16,20)` |
//! | `15..20` | wrist→fingertip angles, thumb..pinky, `atan2(dy, dx)` |
//! | `20..25` | second-joint→fingertip angles ("curls"), thumb..pinky |
//!
//! The matcher compares features positionally against reference patterns,
//! so this order is part of the contract. The curl is a direction, not a
//! bend measurement; reference patterns were tuned against it as is.

use std::ops::Range;

use handsign_sign_model::landmark::{Hand, Point2D, FINGERTIPS, FINGER_BASES, WRIST};
use serde::Serialize;

/// Landmarks whose pairwise distances are measured: wrist, then fingertips.
pub const DISTANCE_KEYPOINTS: [usize; 6] = [
    WRIST,
    FINGERTIPS[0],
    FINGERTIPS[1],
    FINGERTIPS[2],
    FINGERTIPS[3],
    FINGERTIPS[4],
];

/// C(6, 2) pairwise distances.
pub const DISTANCE_COUNT: usize = 15;
pub const ANGLE_COUNT: usize = 5;
pub const CURL_COUNT: usize = 5;

/// Length of the reference feature vector.
pub const FEATURE_COUNT: usize = DISTANCE_COUNT + ANGLE_COUNT + CURL_COUNT;

const DISTANCES: Range<usize> = 0..DISTANCE_COUNT;
const ANGLES: Range<usize> = DISTANCE_COUNT..DISTANCE_COUNT + ANGLE_COUNT;
const CURLS: Range<usize> = DISTANCE_COUNT + ANGLE_COUNT..FEATURE_COUNT;

/// Ordered numeric summary of one hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Distance section, if the vector has the reference layout.
    pub fn distances(&self) -> Option<&[f64]> {
        self.section(DISTANCES)
    }

    /// Angle section, if the vector has the reference layout.
    pub fn angles(&self) -> Option<&[f64]> {
        self.section(ANGLES)
    }

    /// Curl section, if the vector has the reference layout.
    pub fn curls(&self) -> Option<&[f64]> {
        self.section(CURLS)
    }

    fn section(&self, range: Range<usize>) -> Option<&[f64]> {
        if self.values.len() != FEATURE_COUNT {
            return None;
        }
        self.values.get(range)
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Reference feature extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract features from one hand.
    ///
    /// Returns `None` for an empty hand or one without exactly 21 points.
    pub fn extract(&self, hand: &Hand) -> Option<FeatureVector> {
        if !hand.is_well_formed() {
            return None;
        }
        let points = hand.landmarks();

        let mut values = Vec::with_capacity(FEATURE_COUNT);
        push_distances(points, &mut values);
        push_angles(points, &mut values);
        push_curls(points, &mut values);

        debug_assert_eq!(values.len(), FEATURE_COUNT);
        Some(FeatureVector::new(values))
    }
}

fn push_distances(points: &[Point2D], out: &mut Vec<f64>) {
    for (i, &a) in DISTANCE_KEYPOINTS.iter().enumerate() {
        for &b in &DISTANCE_KEYPOINTS[i + 1..] {
            out.push(points[a].distance_to(&points[b]));
        }
    }
}

fn push_angles(points: &[Point2D], out: &mut Vec<f64>) {
    let wrist = &points[WRIST];
    out.extend(FINGERTIPS.iter().map(|&tip| wrist.angle_to(&points[tip])));
}

fn push_curls(points: &[Point2D], out: &mut Vec<f64>) {
    out.extend(
        FINGER_BASES
            .iter()
            .zip(FINGERTIPS.iter())
            .map(|(&base, &tip)| points[base].angle_to(&points[tip])),
    );
}

/// Min-max rescale to `[0, 1]`.
///
/// A constant vector becomes all zeros. An empty vector is returned as is.
pub fn normalize(features: &FeatureVector) -> FeatureVector {
    if features.is_empty() {
        return features.clone();
    }

    let values = features.values();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 {
        return FeatureVector::new(vec![0.0; values.len()]);
    }

    FeatureVector::new(values.iter().map(|v| (v - min) / range).collect())
}
