//! Event log sink
//!
//! Durable record of every trigger. The only implementation appends lines to
//! a text file; the trait exists so the detector can be driven with doubles.

pub mod log_file;

use crate::error::LogWriteError;
use crate::event::Event;

/// Append-only record of vibration events.
#[async_trait::async_trait]
pub trait EventLogSink: Send {
    async fn append(&mut self, event: &Event) -> Result<(), LogWriteError>;
}

pub use log_file::EventLogFile;
