//! Handsign Recognition Core
//!
//! Turns per-frame hand landmarks into confirmed signs:
//! - **Features:** fixed-layout distances, angles, and curls per hand
//! - **Normalization:** min-max rescaling for comparison
//! - **Matching:** pluggable scorer against the sign dictionary
//! - **Classifiers:** per-hand recognizers, dictionary matching or finger counting
//! - **Voting:** majority over a fixed window of frames
//! - **Session:** cooldown, repeat suppression, and the transcript
//!
//! Pure computation: frames and timestamps go in, outcomes come out.

pub mod classifier;
pub mod features;
pub mod matcher;
pub mod session;
pub mod voter;

pub use classifier::{
    classifier_for, DictionaryClassifier, FingerCountClassifier, HandClassifier,
};
pub use features::{normalize, FeatureExtractor, FeatureVector};
pub use matcher::{SignMatcher, SimilarityMatcher};
pub use session::{FrameOutcome, SessionConfig, SignConfirmed, TranslationSession};
pub use voter::TemporalVoter;
