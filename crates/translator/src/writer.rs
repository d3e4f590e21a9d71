//! JSONL event log for presentation-layer consumers.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use handsign_common::error::{HandsignError, HandsignResult};
use serde::{Deserialize, Serialize};

use crate::translator::StampedEvent;

/// Schema version of the event log.
pub const EVENT_LOG_SCHEMA_VERSION: &str = "1.0";

/// First line of an event log, written as a `#` comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogHeader {
    pub schema_version: String,
    /// Wall-clock time the log was opened (RFC 3339).
    pub epoch_wall: String,
    pub dictionary_version: String,
    /// Name of the landmark source the events came from.
    pub source: String,
}

impl EventLogHeader {
    pub fn new(
        epoch_wall: impl Into<String>,
        dictionary_version: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: EVENT_LOG_SCHEMA_VERSION.to_string(),
            epoch_wall: epoch_wall.into(),
            dictionary_version: dictionary_version.into(),
            source: source.into(),
        }
    }
}

/// Writes translator events to a JSONL file, one event per line.
pub struct EventWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    events_written: u64,
}

impl EventWriter {
    /// Create (or truncate) the log and write the header line.
    pub fn new(path: PathBuf, header: &EventLogHeader) -> HandsignResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| HandsignError::translator(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            events_written: 0,
        })
    }

    pub fn write_event(&mut self, event: &StampedEvent) -> HandsignResult<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| HandsignError::translator(format!("Failed to write event: {e}")))?;
        self.events_written += 1;

        if self.events_written % 100 == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> HandsignResult<()> {
        self.writer
            .flush()
            .map_err(|e| HandsignError::translator(format!("Failed to flush events: {e}")))
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Parse an event log, skipping the header and blank lines.
pub fn parse_event_log(content: &str) -> Result<Vec<StampedEvent>, serde_json::Error> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}
