//! Session clock for stamping landmark frames.
//!
//! Frames are timestamped in monotonic nanoseconds relative to the moment
//! a translation run started. Recorded streams carry their own timestamps;
//! live sources that omit them are stamped from this clock.

use std::time::{Duration, Instant};

/// Monotonic timestamp in nanoseconds since the session epoch.
pub type TimestampNs = u64;

/// A clock that provides monotonic timestamps relative to a fixed epoch.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since the epoch.
    pub fn elapsed_ns(&self) -> TimestampNs {
        Self::duration_to_ns(self.epoch.elapsed())
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert nanoseconds to fractional milliseconds.
    pub fn ns_to_ms(ns: TimestampNs) -> f64 {
        ns as f64 / 1_000_000.0
    }

    /// Convert whole milliseconds to nanoseconds.
    pub fn ms_to_ns(ms: u64) -> TimestampNs {
        ms.saturating_mul(1_000_000)
    }

    /// Convert a duration to nanoseconds, saturating at `u64::MAX`.
    pub fn duration_to_ns(duration: Duration) -> TimestampNs {
        u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
    }
}
