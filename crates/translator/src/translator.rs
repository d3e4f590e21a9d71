//! The translation controller.
//!
//! Couples a [`LandmarkSource`] to a [`TranslationSession`], turns frame
//! outcomes into [`TranslatorEvent`]s for subscribers, and hands the
//! transcript to a [`SpeechSynthesizer`] on request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use handsign_common::clock::{SessionClock, TimestampNs};
use handsign_common::config::SpeechConfig;
use handsign_common::error::{HandsignError, HandsignResult};
use handsign_recognition_core::{FrameOutcome, TranslationSession};
use handsign_sign_model::landmark::TimedFrame;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::source::{LandmarkSource, SourcePoll};
use crate::speech::{SpeechSynthesizer, Utterance, Voice};

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslatorState {
    Idle,
    Translating,
    Stopped,
    /// The source failed to start.
    Error,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TranslatorEvent {
    Started,
    Stopped,
    Reset,
    SignDetected {
        name: String,
        sign_id: String,
        confidence: f64,
        transcript: String,
    },
    /// No hand, or no confident match, in the latest frame.
    NoSign,
    Speaking {
        text: String,
    },
    Error {
        message: String,
    },
}

/// An event with the session time it was emitted at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedEvent {
    pub t: TimestampNs,
    #[serde(flatten)]
    pub event: TranslatorEvent,
}

/// Totals for one [`Translator::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    /// Frames with at least one hand.
    pub hands_seen: u64,
    pub confirmed: u64,
    pub transcript: String,
    /// Wall-clock start of the run, RFC 3339.
    pub started_at: String,
}

pub struct Translator {
    source: Box<dyn LandmarkSource>,
    session: TranslationSession,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    speech: SpeechConfig,
    voice: Option<Voice>,
    clock: SessionClock,
    state: TranslatorState,
    stop_flag: Arc<AtomicBool>,
    subscribers: Vec<UnboundedSender<StampedEvent>>,
    // Timestamp of the most recent frame, used to stamp non-frame events.
    last_t: TimestampNs,
}

impl Translator {
    pub fn new(
        source: Box<dyn LandmarkSource>,
        session: TranslationSession,
        speech: SpeechConfig,
    ) -> Self {
        let voice = speech
            .voice
            .as_ref()
            .map(|v| Voice::new(v.clone(), v.clone()));
        Self {
            source,
            session,
            synthesizer: None,
            speech,
            voice,
            clock: SessionClock::start(),
            state: TranslatorState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            subscribers: Vec::new(),
            last_t: 0,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<StampedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Start the source. A no-op while already translating.
    pub fn start(&mut self) -> HandsignResult<()> {
        if self.state == TranslatorState::Translating {
            return Ok(());
        }

        match self.source.start() {
            Ok(()) => {
                self.state = TranslatorState::Translating;
                self.stop_flag.store(false, Ordering::SeqCst);
                tracing::info!(source = %self.source.name(), "Translation started");
                self.emit(TranslatorEvent::Started);
                Ok(())
            }
            Err(e) => {
                self.state = TranslatorState::Error;
                tracing::warn!(source = %self.source.name(), error = %e, "Landmark source failed to start");
                self.emit(TranslatorEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Stop the source. The transcript and session state survive.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if self.state != TranslatorState::Translating {
            return;
        }
        self.source.stop();
        self.state = TranslatorState::Stopped;
        tracing::info!(transcript = %self.session.transcript(), "Translation stopped");
        self.emit(TranslatorEvent::Stopped);
    }

    /// Clear the transcript, voting window, and cooldown.
    pub fn reset(&mut self) {
        self.session.reset();
        self.emit(TranslatorEvent::Reset);
    }

    /// Run one frame through the session. Frames without a timestamp are
    /// stamped from the translator clock.
    pub fn handle_frame(&mut self, frame: TimedFrame) -> FrameOutcome {
        let t = frame
            .timestamp_ns
            .unwrap_or_else(|| self.clock.elapsed_ns());
        self.last_t = t;

        let outcome = self.session.on_frame(&frame.hands, t);
        match &outcome {
            FrameOutcome::Confirmed(confirmed) => {
                self.emit(TranslatorEvent::SignDetected {
                    name: confirmed.sign.name.clone(),
                    sign_id: confirmed.sign.sign_id.clone(),
                    confidence: confirmed.sign.confidence,
                    transcript: confirmed.transcript.clone(),
                });
            }
            other if other.is_no_sign() => self.emit(TranslatorEvent::NoSign),
            _ => {}
        }
        outcome
    }

    /// Poll the source until it finishes or the stop flag is set.
    ///
    /// Starts the source first if needed. Malformed frames are reported as
    /// `Error` events and skipped.
    pub async fn run(&mut self) -> HandsignResult<RunSummary> {
        if self.state != TranslatorState::Translating {
            self.start()?;
        }

        let mut summary = RunSummary {
            frames: 0,
            hands_seen: 0,
            confirmed: 0,
            transcript: String::new(),
            started_at: chrono::Utc::now().to_rfc3339(),
        };

        while !self.stop_flag.load(Ordering::Relaxed) {
            match self.source.poll() {
                Ok(SourcePoll::Frame(frame)) => {
                    summary.frames += 1;
                    if frame.hands.has_hands() {
                        summary.hands_seen += 1;
                    }
                    if self.handle_frame(frame).confirmed().is_some() {
                        summary.confirmed += 1;
                    }
                }
                Ok(SourcePoll::Idle) => {
                    tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
                }
                Ok(SourcePoll::Finished) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Landmark source error");
                    self.emit(TranslatorEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        self.stop();
        summary.transcript = self.session.transcript().to_string();
        tracing::info!(
            frames = summary.frames,
            hands_seen = summary.hands_seen,
            confirmed = summary.confirmed,
            "Translation run finished"
        );
        Ok(summary)
    }

    /// Speak the current transcript.
    ///
    /// Returns `false` without speaking when the transcript is blank.
    pub fn speak(&mut self) -> HandsignResult<bool> {
        let text = self.session.transcript().trim().to_string();
        if text.is_empty() {
            return Ok(false);
        }

        let utterance = Utterance::from_config(text.clone(), self.voice.clone(), &self.speech);
        let result = match self.synthesizer.as_mut() {
            Some(synthesizer) => synthesizer.speak(&utterance),
            None => Err(HandsignError::speech("No speech synthesizer configured")),
        };

        match result {
            Ok(()) => {
                self.emit(TranslatorEvent::Speaking { text });
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Speech failed");
                self.emit(TranslatorEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Voices offered by the synthesizer; empty without one.
    pub fn voices(&self) -> HandsignResult<Vec<Voice>> {
        match &self.synthesizer {
            Some(synthesizer) => synthesizer.voices(),
            None => Ok(Vec::new()),
        }
    }

    /// Select a voice by display name or language tag.
    pub fn select_voice(&mut self, query: &str) -> HandsignResult<Voice> {
        let voice = self
            .voices()?
            .into_iter()
            .find(|v| v.matches(query))
            .ok_or_else(|| HandsignError::speech(format!("Unknown voice '{query}'")))?;
        tracing::debug!(voice = %voice.name, language = %voice.language, "Voice selected");
        self.voice = Some(voice.clone());
        Ok(voice)
    }

    pub fn selected_voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn state(&self) -> TranslatorState {
        self.state
    }

    pub fn transcript(&self) -> &str {
        self.session.transcript()
    }

    pub fn session(&self) -> &TranslationSession {
        &self.session
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    fn emit(&mut self, event: TranslatorEvent) {
        let stamped = StampedEvent {
            t: self.last_t,
            event,
        };
        self.subscribers
            .retain(|tx| tx.send(stamped.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handsign_recognition_core::{FeatureVector, SessionConfig, SignMatcher};
    use handsign_sign_model::dictionary::SignDictionary;
    use handsign_sign_model::landmark::{Hand, LandmarkFrame, Point2D, LANDMARK_COUNT};
    use handsign_sign_model::sign::Candidate;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        start_error: Option<String>,
        frames: VecDeque<SourcePoll>,
    }

    impl LandmarkSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn start(&mut self) -> HandsignResult<()> {
            match &self.start_error {
                Some(message) => Err(HandsignError::pose_source(message.clone())),
                None => Ok(()),
            }
        }

        fn poll(&mut self) -> HandsignResult<SourcePoll> {
            Ok(self.frames.pop_front().unwrap_or(SourcePoll::Finished))
        }

        fn stop(&mut self) {
            self.frames.clear();
        }
    }

    struct AlwaysA;

    impl SignMatcher for AlwaysA {
        fn best_match(&self, _: &FeatureVector, _: &SignDictionary) -> Option<Candidate> {
            Some(Candidate::new("A", "A", 0.9))
        }

        fn name(&self) -> &str {
            "always-a"
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSynth {
        spoken: Arc<Mutex<Vec<Utterance>>>,
    }

    impl SpeechSynthesizer for RecordingSynth {
        fn name(&self) -> &str {
            "recording"
        }

        fn voices(&self) -> HandsignResult<Vec<Voice>> {
            Ok(vec![Voice::new("French", "fr-fr")])
        }

        fn speak(&mut self, utterance: &Utterance) -> HandsignResult<()> {
            self.spoken.lock().unwrap().push(utterance.clone());
            Ok(())
        }
    }

    fn hand_at(t: TimestampNs) -> TimedFrame {
        let hand = Hand::new(
            (0..LANDMARK_COUNT)
                .map(|i| Point2D::new(0.2 + 0.03 * i as f64, 0.8 - 0.02 * i as f64))
                .collect(),
        );
        TimedFrame::new(t, LandmarkFrame::new(vec![hand]))
    }

    fn hand_frame(t: TimestampNs) -> SourcePoll {
        SourcePoll::Frame(hand_at(t))
    }

    fn translator(frames: Vec<SourcePoll>, start_error: Option<&str>) -> Translator {
        let source = ScriptedSource {
            start_error: start_error.map(str::to_string),
            frames: frames.into(),
        };
        let dictionary = Arc::new(SignDictionary::builtin().unwrap());
        let config = SessionConfig {
            window_capacity: 1,
            ..Default::default()
        };
        let session = TranslationSession::with_matcher(dictionary, config, Box::new(AlwaysA));
        Translator::new(Box::new(source), session, SpeechConfig::default())
    }

    fn drain(rx: &mut UnboundedReceiver<StampedEvent>) -> Vec<TranslatorEvent> {
        let mut events = Vec::new();
        while let Ok(stamped) = rx.try_recv() {
            events.push(stamped.event);
        }
        events
    }

    #[test]
    fn test_start_failure_enters_error_state() {
        let mut translator = translator(vec![], Some("camera access denied"));
        let mut rx = translator.subscribe();

        let err = translator.start().unwrap_err();
        assert!(err.to_string().contains("camera access denied"));
        assert_eq!(translator.state(), TranslatorState::Error);

        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [TranslatorEvent::Error { message }] if message.contains("camera access denied")
        ));
    }

    #[test]
    fn test_start_is_idempotent_and_stop_keeps_transcript() {
        let mut translator = translator(vec![], None);
        let mut rx = translator.subscribe();
        translator.start().unwrap();
        translator.start().unwrap();
        translator.handle_frame(hand_at(0));
        translator.stop();

        assert_eq!(translator.state(), TranslatorState::Stopped);
        assert_eq!(translator.transcript(), "A ");
        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&TranslatorEvent::Started));
        assert_eq!(events.last(), Some(&TranslatorEvent::Stopped));
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == TranslatorEvent::Started)
                .count(),
            1
        );
    }

    #[test]
    fn test_empty_frame_emits_no_sign() {
        let mut translator = translator(vec![], None);
        let mut rx = translator.subscribe();
        let outcome = translator.handle_frame(TimedFrame::new(5, LandmarkFrame::empty()));
        assert_eq!(outcome, FrameOutcome::NoHands);
        assert_eq!(drain(&mut rx), vec![TranslatorEvent::NoSign]);
    }

    #[test]
    fn test_speak_with_empty_transcript_does_nothing() {
        let synth = RecordingSynth::default();
        let spoken = synth.spoken.clone();
        let mut translator = translator(vec![], None).with_synthesizer(Box::new(synth));
        let mut rx = translator.subscribe();

        assert!(!translator.speak().unwrap());
        assert!(spoken.lock().unwrap().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_speak_without_synthesizer_is_an_error() {
        let mut translator = translator(vec![], None);
        translator.handle_frame(hand_at(0));
        assert!(translator.speak().is_err());
    }

    #[test]
    fn test_select_voice_and_speak() {
        let synth = RecordingSynth::default();
        let spoken = synth.spoken.clone();
        let mut translator = translator(vec![], None).with_synthesizer(Box::new(synth));
        assert!(translator.select_voice("klingon").is_err());
        translator.select_voice("french").unwrap();

        translator.handle_frame(hand_at(0));
        let mut rx = translator.subscribe();
        assert!(translator.speak().unwrap());

        let spoken = spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "A");
        assert_eq!(spoken[0].voice, Some(Voice::new("French", "fr-fr")));
        assert!((spoken[0].rate - 0.9).abs() < 1e-12);
        assert_eq!(
            drain(&mut rx),
            vec![TranslatorEvent::Speaking {
                text: "A".to_string()
            }]
        );
    }

    #[test]
    fn test_reset_clears_transcript() {
        let mut translator = translator(vec![], None);
        translator.handle_frame(hand_at(0));
        let mut rx = translator.subscribe();
        translator.reset();
        assert_eq!(translator.transcript(), "");
        assert_eq!(drain(&mut rx), vec![TranslatorEvent::Reset]);
    }

    #[tokio::test]
    async fn test_run_until_source_finishes() {
        let frames = vec![
            hand_frame(0),
            SourcePoll::Idle,
            SourcePoll::Frame(TimedFrame::new(10_000_000, LandmarkFrame::empty())),
            hand_frame(20_000_000),
            hand_frame(1_500_000_000),
        ];
        let mut translator = translator(frames, None);
        let mut rx = translator.subscribe();

        let summary = translator.run().await.unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.hands_seen, 3);
        // second hand frame is in the cooldown, third repeats "A"
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.transcript, "A ");
        assert_eq!(translator.state(), TranslatorState::Stopped);

        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&TranslatorEvent::Started));
        assert!(events.contains(&TranslatorEvent::NoSign));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TranslatorEvent::SignDetected { .. }))
                .count(),
            1
        );
        assert_eq!(events.last(), Some(&TranslatorEvent::Stopped));
    }

    #[tokio::test]
    async fn test_run_honours_preset_stop_flag() {
        let mut translator = translator(vec![hand_frame(0)], None);
        translator.start().unwrap();
        translator.stop_flag().store(true, Ordering::SeqCst);
        let summary = translator.run().await.unwrap();
        assert_eq!(summary.frames, 0);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let stamped = StampedEvent {
            t: 7,
            event: TranslatorEvent::SignDetected {
                name: "Hello".to_string(),
                sign_id: "HELLO".to_string(),
                confidence: 0.5,
                transcript: "Hello ".to_string(),
            },
        };
        let json = serde_json::to_value(&stamped).unwrap();
        assert_eq!(json["t"], 7);
        assert_eq!(json["action"], "sign_detected");
        assert_eq!(json["sign_id"], "HELLO");
    }
}
