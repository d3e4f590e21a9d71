//! Speech output.
//!
//! [`SpeechSynthesizer`] is the seam to a text-to-speech engine.
//! [`CommandSynthesizer`] drives an `espeak-ng` compatible program.

use std::process::{Child, Command, Stdio};

use handsign_common::config::SpeechConfig;
use handsign_common::error::{HandsignError, HandsignResult};
use serde::{Deserialize, Serialize};

/// A voice offered by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name, e.g. `English_(America)`.
    pub name: String,
    /// Language tag the synthesizer selects the voice by, e.g. `en-us`.
    pub language: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }

    /// Whether `query` names this voice, by display name or language tag.
    pub fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query) || self.language.eq_ignore_ascii_case(query)
    }
}

/// One request to speak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    /// Synthesizer default when unset.
    pub voice: Option<Voice>,
    /// Rate multiplier, 1.0 is normal speed.
    pub rate: f64,
    /// Pitch multiplier, 1.0 is normal pitch.
    pub pitch: f64,
    /// Volume multiplier, 1.0 is normal volume.
    pub volume: f64,
}

impl Utterance {
    /// Utterance with the configured rate, pitch, and volume.
    pub fn from_config(text: impl Into<String>, voice: Option<Voice>, config: &SpeechConfig) -> Self {
        Self {
            text: text.into(),
            voice,
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }
}

/// Trait for text-to-speech engines.
pub trait SpeechSynthesizer: Send {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Voices the engine offers. May be empty.
    fn voices(&self) -> HandsignResult<Vec<Voice>>;

    /// Start speaking. Returns once playback has been handed off; does not
    /// wait for it to finish.
    fn speak(&mut self, utterance: &Utterance) -> HandsignResult<()>;
}

/// espeak-ng default speed in words per minute.
const BASE_WPM: f64 = 175.0;
const BASE_PITCH: f64 = 50.0;
const BASE_AMPLITUDE: f64 = 100.0;

/// Speaks through an external `espeak-ng` compatible program.
pub struct CommandSynthesizer {
    program: String,
    children: Vec<Child>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            children: Vec::new(),
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.program.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one utterance.
    pub fn command_args(utterance: &Utterance) -> Vec<String> {
        let wpm = (BASE_WPM * utterance.rate).round().clamp(80.0, 450.0);
        let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0);
        let amplitude = (BASE_AMPLITUDE * utterance.volume).round().clamp(0.0, 200.0);

        let mut args = Vec::with_capacity(9);
        if let Some(voice) = &utterance.voice {
            args.push("-v".to_string());
            args.push(voice.language.clone());
        }
        args.extend([
            "-s".to_string(),
            format!("{}", wpm as u32),
            "-p".to_string(),
            format!("{}", pitch as u32),
            "-a".to_string(),
            format!("{}", amplitude as u32),
            utterance.text.clone(),
        ]);
        args
    }

    /// Reap finished speech processes.
    fn reap(&mut self) {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn voices(&self) -> HandsignResult<Vec<Voice>> {
        let output = Command::new(&self.program)
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                HandsignError::speech(format!("Failed to run {} --voices: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HandsignError::speech(format!(
                "{} --voices exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn speak(&mut self, utterance: &Utterance) -> HandsignResult<()> {
        self.reap();
        let args = Self::command_args(utterance);
        tracing::debug!(program = %self.program, args = ?args, "Spawning speech");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HandsignError::speech(format!("Failed to start {}: {e}", self.program)))?;

        tracing::info!(pid = child.id(), chars = utterance.text.len(), "Speech started");
        self.children.push(child);
        Ok(())
    }
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-us           --/M      English_(America)  gmw/en-US     (en 3)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _priority = fields.next()?;
            let language = fields.next()?;
            let _age_gender = fields.next()?;
            let name = fields.next()?;
            Some(Voice::new(name, language))
        })
        .collect()
}
