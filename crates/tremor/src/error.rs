//! Error types for the vibration event loop
//!
//! Only [`InitializationError`] is fatal. The other three are raised inside
//! the loop, reported, and the loop moves on to its next tick.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure reading the accelerometer on one tick.
#[derive(Error, Debug)]
pub enum SensorReadError {
    /// Bus I/O failed
    #[error("sensor bus I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Device returned fewer bytes than requested
    #[error("short read from sensor: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Anything else a source wants to report
    #[error("sensor read failed: {0}")]
    Other(String),
}

/// Failure creating or appending to the event log.
#[derive(Error, Debug)]
pub enum LogWriteError {
    #[error("failed to create log directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to open log file {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to write log file {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("event log unavailable: {0}")]
    Other(String),
}

/// Failure saving a still image.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to create picture directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("capture exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("camera is closed")]
    Closed,

    #[error("capture failed: {0}")]
    Other(String),
}

/// A dependency could not be brought up; the loop must not start.
#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("sensor initialization failed: {0}")]
    Sensor(String),

    #[error("camera initialization failed: {0}")]
    Camera(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("initialization I/O error: {0}")]
    Io(#[from] io::Error),
}
