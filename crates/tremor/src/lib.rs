//! Tremor - vibration event loop for a Pi with an accelerometer and camera
//!
//! Polls an accelerometer at a fixed cadence, reduces each reading to a
//! magnitude, and on a threshold crossing appends a line to an event log and
//! captures a still image. Retriggers are suppressed for a cooldown window.
//!
//! - **Core** (always available): samples, the trigger state machine, the
//!   event loop, the event log file sink, output layout
//! - **`hardware`**: ADXL345 over i2c-dev, `rpicam-still` capture
//! - **`test-source`**: synthetic accelerometer for development without hardware

pub mod capture;
pub mod config;
pub mod detector;
pub mod error;
pub mod event;
pub mod sample;
pub mod sensor;
pub mod sink;
pub mod trigger;

pub use capture::ImageCaptureSink;
pub use config::{DetectorConfig, OutputLayout};
pub use detector::{DetectorStats, DispatchReport, TickOutcome, VibrationDetector};
pub use error::{CaptureError, InitializationError, LogWriteError, SensorReadError};
pub use event::{Event, EventTimestamp};
pub use sample::{reduce, Sample};
pub use sensor::SampleSource;
pub use sink::{EventLogFile, EventLogSink};
pub use trigger::{TriggerController, TriggerDecision, TriggerState};

#[cfg(feature = "hardware")]
pub use capture::{StillCamera, StillCameraConfig};
#[cfg(feature = "hardware")]
pub use sensor::{Adxl345, Adxl345Config};
#[cfg(feature = "test-source")]
pub use sensor::{SimulatedSensor, SimulatedSensorConfig};
