//! Error types shared across handsign crates.
//!
//! Only collaborator failures are errors. A hand that cannot be featurized
//! or a frame with no confident match is an ordinary value, not an error.

use std::path::PathBuf;

/// Top-level error type for handsign operations.
#[derive(Debug, thiserror::Error)]
pub enum HandsignError {
    #[error("Pose source error: {message}")]
    PoseSource { message: String },

    #[error("Speech error: {message}")]
    Speech { message: String },

    #[error("Dictionary error: {message}")]
    Dictionary { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Translator error: {message}")]
    Translator { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HandsignError.
pub type HandsignResult<T> = Result<T, HandsignError>;

impl HandsignError {
    pub fn pose_source(msg: impl Into<String>) -> Self {
        Self::PoseSource {
            message: msg.into(),
        }
    }

    pub fn speech(msg: impl Into<String>) -> Self {
        Self::Speech {
            message: msg.into(),
        }
    }

    pub fn dictionary(msg: impl Into<String>) -> Self {
        Self::Dictionary {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn translator(msg: impl Into<String>) -> Self {
        Self::Translator {
            message: msg.into(),
        }
    }
}
