//! Still image capture
//!
//! On a Pi the camera is driven through `rpicam-still`; see [`still`].

#[cfg(feature = "hardware")]
pub mod still;

use std::path::PathBuf;

use crate::error::CaptureError;
use crate::event::EventTimestamp;

/// Saves one still per trigger.
#[async_trait::async_trait]
pub trait ImageCaptureSink: Send {
    /// Capture a still for the event at `timestamp`, returning where it was written.
    async fn capture(&mut self, timestamp: &EventTimestamp) -> Result<PathBuf, CaptureError>;
}

#[cfg(feature = "hardware")]
pub use still::{StillCamera, StillCameraConfig};
