//! Handsign Translator
//!
//! Drives the recognition pipeline from a stream of landmark frames and
//! talks to the collaborators around it:
//!
//! - **Sources:** pose-estimation output, replayed from JSONL, optionally on a reader thread
//! - **Speech:** an `espeak-ng` compatible synthesizer
//! - **Events:** a channel for presentation layers, optionally logged as JSONL

pub mod source;
pub mod speech;
pub mod translator;
pub mod writer;

pub use source::{BackgroundSource, JsonlSource, LandmarkSource, SourcePoll};
pub use speech::{CommandSynthesizer, SpeechSynthesizer, Utterance, Voice};
pub use translator::{RunSummary, StampedEvent, Translator, TranslatorEvent, TranslatorState};
pub use writer::{EventLogHeader, EventWriter};
