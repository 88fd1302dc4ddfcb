//! Detector configuration and output layout
//!
//! Everything the event loop needs is carried in a [`DetectorConfig`] value
//! handed to [`VibrationDetector::new`](crate::VibrationDetector::new). There
//! is no process-wide state.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{InitializationError, LogWriteError};
use crate::event::EventTimestamp;
use crate::sink::log_file::ensure_log_file;
use crate::trigger::MAX_COOLDOWN;

/// Longest accepted delay between sensor reads.
pub const MAX_SAMPLING_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Event loop configuration.
///
/// Field names match the keys accepted in a JSON config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Delay between sensor reads (seconds)
    pub sampling_interval_seconds: f64,
    /// Magnitude (m/s²) that must be strictly exceeded to trigger
    pub vibration_threshold: f64,
    /// Retrigger suppression after an event (seconds)
    pub cooldown_seconds: f64,
    /// Root directory holding the log and the picture directory
    pub output_root: PathBuf,
    /// Log file name inside `output_root`
    pub log_filename: String,
    /// Picture directory name inside `output_root`
    pub picture_subdir: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sampling_interval_seconds: 0.1,
            vibration_threshold: 10.0,
            cooldown_seconds: 2.0,
            output_root: PathBuf::from("vibration_output"),
            log_filename: "vibration_log.txt".to_string(),
            picture_subdir: "vibration_pictures".to_string(),
        }
    }
}

impl DetectorConfig {
    /// Zero if the value is out of range; [`validate`](Self::validate) rejects those.
    pub fn sampling_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.sampling_interval_seconds).unwrap_or_default()
    }

    /// Zero if the value is out of range; [`validate`](Self::validate) rejects those.
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_seconds).unwrap_or_default()
    }

    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> Result<(), InitializationError> {
        let interval = self.sampling_interval_seconds;
        match Duration::try_from_secs_f64(interval) {
            Ok(d) if !d.is_zero() && d <= MAX_SAMPLING_INTERVAL => {}
            _ => {
                return Err(InitializationError::Config(format!(
                    "sampling_interval_seconds must be > 0 and at most {}, got {interval}",
                    MAX_SAMPLING_INTERVAL.as_secs()
                )))
            }
        }
        let cooldown = self.cooldown_seconds;
        match Duration::try_from_secs_f64(cooldown) {
            Ok(d) if d <= MAX_COOLDOWN => {}
            _ => {
                return Err(InitializationError::Config(format!(
                    "cooldown_seconds must be >= 0 and at most {}, got {cooldown}",
                    MAX_COOLDOWN.as_secs()
                )))
            }
        }
        let threshold = self.vibration_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(InitializationError::Config(format!(
                "vibration_threshold must be a non-negative number, got {threshold}"
            )));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(InitializationError::Config("output_root is empty".into()));
        }
        if self.log_filename.is_empty() {
            return Err(InitializationError::Config("log_filename is empty".into()));
        }
        if self.picture_subdir.is_empty() {
            return Err(InitializationError::Config("picture_subdir is empty".into()));
        }
        Ok(())
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_root, &self.log_filename, &self.picture_subdir)
    }
}

/// Resolved on-disk locations for the log file and pictures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub log_file: PathBuf,
    pub picture_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>, log_filename: &str, picture_subdir: &str) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            log_file: root.join(log_filename),
            picture_dir: root.join(picture_subdir),
            root,
        }
    }

    /// Path a still for the given timestamp is written to.
    ///
    /// Second resolution: two events within the same wall-clock second map
    /// to the same file and the later capture overwrites the earlier one.
    pub fn picture_path(&self, timestamp: &EventTimestamp) -> PathBuf {
        picture_path(&self.picture_dir, timestamp)
    }

    /// Create the picture directory and the log file (with header) if missing.
    ///
    /// Safe to call repeatedly; an existing log is never truncated.
    pub fn prepare(&self) -> Result<(), LogWriteError> {
        if !self.picture_dir.is_dir() {
            fs::create_dir_all(&self.picture_dir).map_err(|source| LogWriteError::CreateDir {
                path: self.picture_dir.clone(),
                source,
            })?;
            info!("Created directory: {:?}", self.picture_dir);
        }
        ensure_log_file(&self.log_file)?;
        Ok(())
    }
}

/// `<dir>/vibration_<YYYYMMDD_HHMMSS>.jpg`
pub fn picture_path(dir: &Path, timestamp: &EventTimestamp) -> PathBuf {
    dir.join(format!("vibration_{}.jpg", timestamp.label()))
}
