//! Per-frame orchestration of the recognition pipeline.
//!
//! A [`TranslationSession`] owns the voting window and the transcript. Each
//! frame hands the first hand to a [`HandClassifier`], feeds the voter,
//! and, when the window resolves, appends the winner to the transcript
//! unless the repeat policy suppresses it. A cooldown enforces a minimum
//! spacing between confirmed signs.

use std::collections::HashSet;
use std::sync::Arc;

use handsign_common::clock::{SessionClock, TimestampNs};
use handsign_common::config::{RecognitionConfig, RecognizerKind, RepeatPolicy};
use handsign_sign_model::dictionary::SignDictionary;
use handsign_sign_model::landmark::LandmarkFrame;
use handsign_sign_model::sign::Candidate;
use serde::Serialize;

use crate::classifier::{classifier_for, DictionaryClassifier, HandClassifier};
use crate::matcher::{SignMatcher, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::voter::{TemporalVoter, DEFAULT_WINDOW_CAPACITY};

/// Default minimum spacing between confirmed signs.
pub const DEFAULT_COOLDOWN_NS: TimestampNs = 1_000_000_000;

/// Session tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// A resolved sign must exceed this to be confirmed.
    pub confidence_threshold: f64,

    /// Voting window size in frames.
    pub window_capacity: usize,

    /// Minimum time between confirmed signs.
    pub cooldown_ns: TimestampNs,

    /// Appended after each sign name in the transcript.
    pub separator: String,

    /// Recognizer built by [`TranslationSession::new`].
    pub recognizer: RecognizerKind,

    pub repeat_policy: RepeatPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            cooldown_ns: DEFAULT_COOLDOWN_NS,
            separator: " ".to_string(),
            recognizer: RecognizerKind::default(),
            repeat_policy: RepeatPolicy::default(),
        }
    }
}

impl From<&RecognitionConfig> for SessionConfig {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            window_capacity: config.buffer_size,
            cooldown_ns: SessionClock::ms_to_ns(config.cooldown_ms),
            separator: config.separator.clone(),
            recognizer: config.recognizer,
            repeat_policy: config.repeat_policy,
        }
    }
}

/// A sign appended to the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignConfirmed {
    pub sign: Candidate,
    /// Transcript after appending this sign.
    pub transcript: String,
    pub at_ns: TimestampNs,
}

/// What one frame did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The frame had no hands. Nothing changed.
    NoHands,
    /// Dropped before extraction; a sign was confirmed too recently.
    CoolingDown { remaining_ns: TimestampNs },
    /// The first hand was malformed or matched nothing confidently.
    Unrecognized,
    /// A candidate entered the voting window, which is not yet full.
    Accumulating { candidate: Candidate, filled: usize },
    /// The window resolved to a new sign.
    Confirmed(SignConfirmed),
    /// The window resolved to a sign the repeat policy suppresses.
    Repeated(Candidate),
    /// The window resolved to a sign at or below the threshold.
    LowConfidence(Candidate),
}

impl FrameOutcome {
    pub fn confirmed(&self) -> Option<&SignConfirmed> {
        match self {
            FrameOutcome::Confirmed(confirmed) => Some(confirmed),
            _ => None,
        }
    }

    /// Whether collaborators should show "no sign currently visible".
    pub fn is_no_sign(&self) -> bool {
        matches!(self, FrameOutcome::NoHands | FrameOutcome::Unrecognized)
    }
}

#[derive(Debug, Clone, Default)]
struct TranslationState {
    transcript: String,
    last_emitted_sign_id: Option<String>,
    last_emit_ns: Option<TimestampNs>,
    emitted_sign_ids: HashSet<String>,
}

/// Owned, single-run recognition session.
pub struct TranslationSession {
    classifier: Box<dyn HandClassifier>,
    voter: TemporalVoter,
    config: SessionConfig,
    state: TranslationState,
}

impl TranslationSession {
    /// Create a session using the configured recognizer.
    pub fn new(dictionary: Arc<SignDictionary>, config: SessionConfig) -> Self {
        let classifier =
            classifier_for(config.recognizer, dictionary, config.confidence_threshold);
        Self::with_classifier(config, classifier)
    }

    /// Create a dictionary-matching session with a custom matcher.
    pub fn with_matcher(
        dictionary: Arc<SignDictionary>,
        config: SessionConfig,
        matcher: Box<dyn SignMatcher>,
    ) -> Self {
        Self::with_classifier(config, Box::new(DictionaryClassifier::new(dictionary, matcher)))
    }

    /// Create a session around any per-hand classifier.
    pub fn with_classifier(config: SessionConfig, classifier: Box<dyn HandClassifier>) -> Self {
        Self {
            classifier,
            voter: TemporalVoter::new(config.window_capacity),
            config,
            state: TranslationState::default(),
        }
    }

    /// Process one frame observed at `now_ns`.
    pub fn on_frame(&mut self, frame: &LandmarkFrame, now_ns: TimestampNs) -> FrameOutcome {
        let Some(hand) = frame.first_hand() else {
            return FrameOutcome::NoHands;
        };

        if let Some(last) = self.state.last_emit_ns {
            let elapsed = now_ns.saturating_sub(last);
            if elapsed < self.config.cooldown_ns {
                return FrameOutcome::CoolingDown {
                    remaining_ns: self.config.cooldown_ns - elapsed,
                };
            }
        }

        let Some(candidate) = self.classifier.classify(hand) else {
            return FrameOutcome::Unrecognized;
        };

        tracing::trace!(
            sign = %candidate.sign_id,
            confidence = candidate.confidence,
            hands = frame.hand_count(),
            "Frame candidate"
        );

        let Some(resolved) = self.voter.observe(Some(candidate.clone())) else {
            return FrameOutcome::Accumulating {
                candidate,
                filled: self.voter.len(),
            };
        };

        if resolved.confidence <= self.config.confidence_threshold {
            tracing::debug!(
                sign = %resolved.sign_id,
                confidence = resolved.confidence,
                "Resolved sign below threshold"
            );
            return FrameOutcome::LowConfidence(resolved);
        }

        if self.is_repeat(&resolved.sign_id) {
            tracing::debug!(
                sign = %resolved.sign_id,
                policy = %self.config.repeat_policy,
                "Suppressed repeated sign"
            );
            return FrameOutcome::Repeated(resolved);
        }

        self.state.transcript.push_str(&resolved.name);
        self.state.transcript.push_str(&self.config.separator);
        self.state.last_emitted_sign_id = Some(resolved.sign_id.clone());
        self.state.emitted_sign_ids.insert(resolved.sign_id.clone());
        // Never moves backwards, even for a late frame under a zero cooldown.
        self.state.last_emit_ns = Some(
            self.state
                .last_emit_ns
                .map_or(now_ns, |last| last.max(now_ns)),
        );

        tracing::info!(
            sign = %resolved.sign_id,
            name = %resolved.name,
            confidence = resolved.confidence,
            at_ns = now_ns,
            "Sign confirmed"
        );

        FrameOutcome::Confirmed(SignConfirmed {
            sign: resolved,
            transcript: self.state.transcript.clone(),
            at_ns: now_ns,
        })
    }

    fn is_repeat(&self, sign_id: &str) -> bool {
        match self.config.repeat_policy {
            RepeatPolicy::Previous => self.state.last_emitted_sign_id.as_deref() == Some(sign_id),
            RepeatPolicy::Anywhere => self.state.emitted_sign_ids.contains(sign_id),
        }
    }

    /// Clear the transcript, the voting window, the last sign, and the cooldown.
    pub fn reset(&mut self) {
        self.state = TranslationState::default();
        self.voter.clear();
        tracing::debug!("Translation session reset");
    }

    /// Accumulated transcript, including trailing separator.
    pub fn transcript(&self) -> &str {
        &self.state.transcript
    }

    pub fn last_emitted_sign_id(&self) -> Option<&str> {
        self.state.last_emitted_sign_id.as_deref()
    }

    pub fn last_emit_ns(&self) -> Option<TimestampNs> {
        self.state.last_emit_ns
    }

    /// Candidates waiting in the voting window.
    pub fn window_len(&self) -> usize {
        self.voter.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handsign_sign_model::landmark::{Hand, Point2D, LANDMARK_COUNT};

    /// Matcher that returns a fixed candidate whenever features are present.
    struct FixedMatcher(Candidate);

    impl SignMatcher for FixedMatcher {
        fn best_match(&self, _: &crate::FeatureVector, _: &SignDictionary) -> Option<Candidate> {
            Some(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Classifier that cycles through a fixed list of sign ids.
    struct SequenceClassifier {
        ids: Vec<String>,
        next: std::sync::atomic::AtomicUsize,
    }

    impl SequenceClassifier {
        fn new(ids: &[&str]) -> Self {
            Self {
                ids: ids.iter().map(|id| id.to_string()).collect(),
                next: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    impl HandClassifier for SequenceClassifier {
        fn classify(&self, _: &Hand) -> Option<Candidate> {
            let i = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            let id = &self.ids[i % self.ids.len()];
            Some(Candidate::new(id.as_str(), id.as_str(), 0.9))
        }

        fn name(&self) -> &str {
            "sequence"
        }
    }

    fn hand() -> Hand {
        let points = (0..LANDMARK_COUNT)
            .map(|i| Point2D::new(0.3 + 0.01 * i as f64, 0.9 - 0.03 * i as f64))
            .collect();
        Hand::new(points)
    }

    fn session_with(candidate: Candidate, window: usize) -> TranslationSession {
        let dictionary = Arc::new(SignDictionary::builtin().unwrap());
        let config = SessionConfig {
            window_capacity: window,
            ..Default::default()
        };
        TranslationSession::with_matcher(dictionary, config, Box::new(FixedMatcher(candidate)))
    }

    #[test]
    fn test_config_from_recognition_config() {
        let config = SessionConfig::from(&RecognitionConfig {
            cooldown_ms: 250,
            buffer_size: 7,
            ..Default::default()
        });
        assert_eq!(config.cooldown_ns, 250_000_000);
        assert_eq!(config.window_capacity, 7);
        assert_eq!(config, SessionConfig {
            cooldown_ns: 250_000_000,
            window_capacity: 7,
            ..Default::default()
        });
    }

    #[test]
    fn test_empty_frame_touches_nothing() {
        let mut session = session_with(Candidate::new("A", "A", 0.9), 2);
        session.on_frame(&LandmarkFrame::new(vec![hand()]), 0);
        assert_eq!(session.on_frame(&LandmarkFrame::empty(), 10), FrameOutcome::NoHands);
        assert_eq!(session.window_len(), 1);
    }

    #[test]
    fn test_malformed_hand_is_unrecognized() {
        let mut session = session_with(Candidate::new("A", "A", 0.9), 2);
        let frame = LandmarkFrame::new(vec![Hand::new(vec![Point2D::new(0.5, 0.5); 5])]);
        let outcome = session.on_frame(&frame, 0);
        assert_eq!(outcome, FrameOutcome::Unrecognized);
        assert!(outcome.is_no_sign());
        assert_eq!(session.window_len(), 0);
    }

    #[test]
    fn test_only_first_hand_is_used() {
        let mut session = session_with(Candidate::new("A", "A", 0.9), 1);
        let malformed = Hand::new(vec![]);
        let frame = LandmarkFrame::new(vec![malformed, hand()]);
        assert_eq!(session.on_frame(&frame, 0), FrameOutcome::Unrecognized);
    }

    #[test]
    fn test_accumulating_reports_fill_level() {
        let mut session = session_with(Candidate::new("A", "A", 0.9), 3);
        let frame = LandmarkFrame::new(vec![hand()]);
        match session.on_frame(&frame, 0) {
            FrameOutcome::Accumulating { filled, candidate } => {
                assert_eq!(filled, 1);
                assert_eq!(candidate.sign_id, "A");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_low_confidence_resolution_is_not_emitted() {
        let mut session = session_with(Candidate::new("A", "A", 0.5), 1);
        let frame = LandmarkFrame::new(vec![hand()]);
        let outcome = session.on_frame(&frame, 0);
        assert!(matches!(outcome, FrameOutcome::LowConfidence(_)));
        assert_eq!(session.transcript(), "");
        assert_eq!(session.last_emit_ns(), None);
    }

    #[test]
    fn test_custom_separator() {
        let dictionary = Arc::new(SignDictionary::builtin().unwrap());
        let config = SessionConfig {
            window_capacity: 1,
            separator: " | ".to_string(),
            ..Default::default()
        };
        let mut session = TranslationSession::with_matcher(
            dictionary,
            config,
            Box::new(FixedMatcher(Candidate::new("HELLO", "Hello", 0.9))),
        );
        session.on_frame(&LandmarkFrame::new(vec![hand()]), 0);
        assert_eq!(session.transcript(), "Hello | ");
        assert_eq!(session.classifier_name(), "fixed");
    }

    #[test]
    fn test_late_frame_never_moves_last_emit_backwards() {
        let config = SessionConfig {
            window_capacity: 1,
            cooldown_ns: 0,
            ..Default::default()
        };
        let mut session = TranslationSession::with_classifier(
            config,
            Box::new(SequenceClassifier::new(&["A", "B"])),
        );
        let frame = LandmarkFrame::new(vec![hand()]);

        assert!(session.on_frame(&frame, 5_000_000_000).confirmed().is_some());
        let late = session.on_frame(&frame, 1_000_000_000);
        assert_eq!(late.confirmed().map(|c| c.at_ns), Some(1_000_000_000));
        assert_eq!(session.last_emit_ns(), Some(5_000_000_000));
        assert_eq!(session.transcript(), "A B ");
    }

    #[test]
    fn test_anywhere_policy_suppresses_earlier_signs() {
        let config = SessionConfig {
            window_capacity: 1,
            cooldown_ns: 0,
            repeat_policy: RepeatPolicy::Anywhere,
            ..Default::default()
        };
        let mut session = TranslationSession::with_classifier(
            config,
            Box::new(SequenceClassifier::new(&["A", "B", "A", "C"])),
        );
        let frame = LandmarkFrame::new(vec![hand()]);

        let outcomes: Vec<_> = (0..4).map(|i| session.on_frame(&frame, i * 10)).collect();
        assert!(matches!(&outcomes[2], FrameOutcome::Repeated(c) if c.sign_id == "A"));
        assert_eq!(session.transcript(), "A B C ");

        session.reset();
        assert!(session.on_frame(&frame, 100).confirmed().is_some());
    }

    #[test]
    fn test_previous_policy_allows_earlier_signs() {
        let config = SessionConfig {
            window_capacity: 1,
            cooldown_ns: 0,
            ..Default::default()
        };
        let mut session = TranslationSession::with_classifier(
            config,
            Box::new(SequenceClassifier::new(&["A", "B", "A"])),
        );
        let frame = LandmarkFrame::new(vec![hand()]);
        for t in 0..3 {
            session.on_frame(&frame, t);
        }
        assert_eq!(session.transcript(), "A B A ");
    }

    #[test]
    fn test_cooldown_reports_remaining_time() {
        let mut session = session_with(Candidate::new("A", "A", 0.9), 1);
        let frame = LandmarkFrame::new(vec![hand()]);
        assert!(session.on_frame(&frame, 1_000).confirmed().is_some());
        assert_eq!(
            session.on_frame(&frame, 400_001_000),
            FrameOutcome::CoolingDown {
                remaining_ns: 600_000_000
            }
        );
    }
}
