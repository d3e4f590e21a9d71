//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HandsignError, HandsignResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recognition pipeline tuning.
    pub recognition: RecognitionConfig,

    /// Speech synthesis settings.
    pub speech: SpeechConfig,

    /// Optional custom sign dictionary (JSON). Built-in table when unset.
    pub dictionary: Option<PathBuf>,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Recognition pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Minimum similarity a candidate must exceed, in [0.0, 1.0).
    pub confidence_threshold: f64,

    /// Number of per-frame candidates voted on at once.
    pub buffer_size: usize,

    /// Minimum spacing between two confirmed signs (milliseconds).
    pub cooldown_ms: u64,

    /// Appended to the transcript after every confirmed sign name.
    pub separator: String,

    /// How a single hand is turned into a candidate sign.
    pub recognizer: RecognizerKind,

    /// Which earlier signs suppress a newly resolved one.
    pub repeat_policy: RepeatPolicy,
}

/// Per-hand recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerKind {
    /// Feature similarity against the sign dictionary.
    #[default]
    Similarity,
    /// Extended-finger count mapped to FIST, ONE .. FIVE.
    FingerCount,
}

impl RecognizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::FingerCount => "finger_count",
        }
    }
}

impl std::fmt::Display for RecognizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for RecognizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "similarity" => Ok(Self::Similarity),
            "finger_count" | "fingers" => Ok(Self::FingerCount),
            other => Err(format!("unknown recognizer: {other}")),
        }
    }
}

/// Repeat suppression rule for the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Only the sign confirmed last is suppressed.
    #[default]
    Previous,
    /// Any sign already in the transcript is suppressed.
    Anywhere,
}

impl RepeatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Previous => "previous",
            Self::Anywhere => "anywhere",
        }
    }
}

impl std::fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for RepeatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "previous" => Ok(Self::Previous),
            "anywhere" => Ok(Self::Anywhere),
            other => Err(format!("unknown repeat policy: {other}")),
        }
    }
}

/// Speech synthesis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// espeak-ng compatible synthesizer program.
    pub program: String,

    /// Voice name; the synthesizer's default when unset.
    pub voice: Option<String>,

    /// Speaking rate multiplier (1.0 = normal).
    pub rate: f64,

    /// Pitch multiplier (1.0 = normal).
    pub pitch: f64,

    /// Volume multiplier (1.0 = normal).
    pub volume: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "handsign=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            speech: SpeechConfig::default(),
            dictionary: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.75,
            buffer_size: 5,
            cooldown_ms: 1000,
            separator: " ".to_string(),
            recognizer: RecognizerKind::default(),
            repeat_policy: RepeatPolicy::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            voice: None,
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RecognitionConfig {
    /// Reject parameters the pipeline cannot run with.
    pub fn validate(&self) -> HandsignResult<()> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(HandsignError::config(format!(
                "confidence_threshold must be in [0, 1), got {}",
                self.confidence_threshold
            )));
        }
        if self.buffer_size == 0 {
            return Err(HandsignError::config("buffer_size must be at least 1"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing or invalid files are errors.
    pub fn load_from(path: &Path) -> HandsignResult<Self> {
        if !path.exists() {
            return Err(HandsignError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.recognition.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("handsign").join("config.json")
}
