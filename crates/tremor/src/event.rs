//! Vibration events and their timestamps

use chrono::{DateTime, Local};
use std::fmt;
use tokio::time::Instant;

/// Wall-clock format shared by log lines and picture names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// When an event happened.
///
/// The monotonic instant drives cooldown arithmetic; the wall-clock reading
/// is only used for the human-readable label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTimestamp {
    pub instant: Instant,
    pub wall: DateTime<Local>,
}

impl EventTimestamp {
    pub fn new(instant: Instant, wall: DateTime<Local>) -> Self {
        Self { instant, wall }
    }

    /// Pair the given monotonic instant with the current local time.
    pub fn at(instant: Instant) -> Self {
        Self::new(instant, Local::now())
    }

    /// `YYYYMMDD_HHMMSS`
    pub fn label(&self) -> String {
        self.wall.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wall.format(TIMESTAMP_FORMAT))
    }
}

/// A threshold crossing observed while the detector was idle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub timestamp: EventTimestamp,
    pub magnitude: f64,
}

impl Event {
    /// The line appended to the event log, newline included.
    ///
    /// The magnitude keeps a fractional part even when whole (`12.0`).
    pub fn log_line(&self) -> String {
        format!("{} - Vibration detected: {:?}\n", self.timestamp, self.magnitude)
    }
}
