//! Hand landmark types.
//!
//! A hand is the 21-point skeleton emitted by the pose model, indexed by
//! anatomical meaning. Frames arrive as JSONL, one object per line:
//!
//! ```text
//! # {"source":"mediapipe-hands","max_num_hands":2}
//! {"t":33000000,"hands":[[{"x":0.51,"y":0.82}, ...]]}
//! ```

use handsign_common::clock::TimestampNs;
use serde::{Deserialize, Serialize};

/// Number of landmarks in a well-formed hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Fingertips, thumb to pinky.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Second joint of each finger, thumb to pinky.
pub const FINGER_BASES: [usize; 5] = [THUMB_MCP, INDEX_PIP, MIDDLE_PIP, RING_PIP, PINKY_PIP];

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Angle of the vector from `self` to `other`, via `atan2(dy, dx)`.
    pub fn angle_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

/// Axis-aligned box around a hand, normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected hand.
///
/// Deserialization accepts any number of points so that malformed
/// detections reach the extractor, which rejects them softly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    landmarks: Vec<Point2D>,
}

impl Hand {
    pub fn new(landmarks: Vec<Point2D>) -> Self {
        Self { landmarks }
    }

    pub fn landmarks(&self) -> &[Point2D] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Whether the hand has exactly [`LANDMARK_COUNT`] points.
    pub fn is_well_formed(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT
    }

    /// Landmark by anatomical index.
    pub fn point(&self, index: usize) -> Option<&Point2D> {
        self.landmarks.get(index)
    }

    /// Bounding box over all landmarks. `None` for an empty hand.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.landmarks.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.landmarks[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    /// Whether every landmark lies inside the image. False for an empty hand.
    pub fn is_in_frame(&self) -> bool {
        !self.landmarks.is_empty()
            && self
                .landmarks
                .iter()
                .all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y))
    }
}

/// All hands detected in one image, in detection order.
///
/// Detection order is not stable across frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    hands: Vec<Hand>,
}

impl LandmarkFrame {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self { hands }
    }

    /// A frame in which the pose model found nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn first_hand(&self) -> Option<&Hand> {
        self.hands.first()
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }
}

impl From<Vec<Hand>> for LandmarkFrame {
    fn from(hands: Vec<Hand>) -> Self {
        Self::new(hands)
    }
}

/// A landmark frame as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedFrame {
    /// Monotonic nanoseconds since the stream started. Live sources may
    /// omit it and let the consumer stamp the frame on arrival.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ns: Option<TimestampNs>,

    /// Detected hands.
    #[serde(default)]
    pub hands: LandmarkFrame,
}

impl TimedFrame {
    pub fn new(timestamp_ns: TimestampNs, hands: LandmarkFrame) -> Self {
        Self {
            timestamp_ns: Some(timestamp_ns),
            hands,
        }
    }

    /// A frame without a timestamp.
    pub fn unstamped(hands: LandmarkFrame) -> Self {
        Self {
            timestamp_ns: None,
            hands,
        }
    }
}

/// Parse one JSONL line. Blank lines and `#` header comments yield `None`.
pub fn parse_frame_line(line: &str) -> Option<Result<TimedFrame, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Parse frames from JSONL content (one JSON object per line).
pub fn parse_frames(jsonl: &str) -> Result<Vec<TimedFrame>, serde_json::Error> {
    jsonl.lines().filter_map(parse_frame_line).collect()
}

/// Serialize frames to JSONL format.
pub fn serialize_frames(frames: &[TimedFrame]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal_hand() -> Hand {
        let points = (0..LANDMARK_COUNT)
            .map(|i| Point2D::new(0.2 + 0.03 * i as f64, 0.8 - 0.02 * i as f64))
            .collect();
        Hand::new(points)
    }

    #[test]
    fn test_well_formed_requires_21_points() {
        assert!(diagonal_hand().is_well_formed());
        assert!(!Hand::new(vec![Point2D::new(0.5, 0.5); 20]).is_well_formed());
        assert!(!Hand::new(vec![]).is_well_formed());
    }

    #[test]
    fn test_bounding_box() {
        let hand = Hand::new(vec![
            Point2D::new(0.2, 0.4),
            Point2D::new(0.6, 0.1),
            Point2D::new(0.3, 0.9),
        ]);
        let bbox = hand.bounding_box().unwrap();
        assert!((bbox.x - 0.2).abs() < 1e-12);
        assert!((bbox.y - 0.1).abs() < 1e-12);
        assert!((bbox.width - 0.4).abs() < 1e-12);
        assert!((bbox.height - 0.8).abs() < 1e-12);

        assert!(Hand::new(vec![]).bounding_box().is_none());
    }

    #[test]
    fn test_is_in_frame() {
        assert!(diagonal_hand().is_in_frame());
        assert!(!Hand::new(vec![Point2D::new(1.2, 0.5)]).is_in_frame());
        assert!(!Hand::new(vec![Point2D::new(0.5, -0.01)]).is_in_frame());
        assert!(!Hand::new(vec![]).is_in_frame());
    }

    #[test]
    fn test_angle_to_uses_atan2_convention() {
        let origin = Point2D::new(0.0, 0.0);
        assert!((origin.angle_to(&Point2D::new(1.0, 0.0))).abs() < 1e-12);
        let up = origin.angle_to(&Point2D::new(0.0, 1.0));
        assert!((up - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let back = origin.angle_to(&Point2D::new(-1.0, 0.0));
        assert!((back - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_frame_wire_format() {
        let frame = TimedFrame::new(
            33_000_000,
            LandmarkFrame::new(vec![Hand::new(vec![Point2D::new(0.5, 0.25)])]),
        );
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"t":33000000,"hands":[[{"x":0.5,"y":0.25}]]}"#);
    }

    #[test]
    fn test_parse_frames_skips_header_and_blank_lines() {
        let jsonl = "# {\"source\":\"test\"}\n\n{\"t\":0,\"hands\":[]}\n{\"hands\":[]}\n";
        let frames = parse_frames(jsonl).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_ns, Some(0));
        assert!(!frames[0].hands.has_hands());
        assert_eq!(frames[1].timestamp_ns, None);
    }

    #[test]
    fn test_parse_frames_rejects_garbage() {
        assert!(parse_frames("{\"t\":\"soon\"}").is_err());
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let hand = Hand::new(vec![Point2D::new(0.5, 0.25); LANDMARK_COUNT]);
        let frames = vec![
            TimedFrame::new(0, LandmarkFrame::empty()),
            TimedFrame::new(33_000_000, LandmarkFrame::new(vec![hand.clone()])),
            TimedFrame::unstamped(LandmarkFrame::new(vec![hand.clone(), hand])),
        ];
        let jsonl = serialize_frames(&frames).unwrap();
        assert_eq!(parse_frames(&jsonl).unwrap(), frames);
    }
}
