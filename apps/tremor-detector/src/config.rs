//! Detector binary configuration
//!
//! Defaults, then an optional JSON file named by `TREMOR_CONFIG`, then
//! individual environment overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tremor::{Adxl345Config, DetectorConfig, StillCameraConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub bus: Option<u8>,
    pub address: Option<u16>,
}

impl SensorSettings {
    pub fn to_adxl345(&self) -> Adxl345Config {
        let defaults = Adxl345Config::default();
        Adxl345Config {
            bus: self.bus.unwrap_or(defaults.bus),
            address: self.address.unwrap_or(defaults.address),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub program: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub timeout_seconds: Option<f64>,
}

impl CameraSettings {
    pub fn to_still_camera(&self) -> StillCameraConfig {
        let defaults = StillCameraConfig::default();
        StillCameraConfig {
            program: self.program.clone().unwrap_or(defaults.program),
            width: self.width.or(defaults.width),
            height: self.height.or(defaults.height),
            quality: self.quality.unwrap_or(defaults.quality).clamp(1, 100),
            timeout: self
                .timeout_seconds
                .filter(|s| s.is_finite() && *s > 0.0)
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}

/// Everything the binary needs to bring the detector up.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub detector: DetectorConfig,
    pub sensor: SensorSettings,
    pub camera: CameraSettings,
    /// Use the synthetic accelerometer (needs the `test-source` feature)
    pub simulate: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("TREMOR_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
            .detector
            .validate()
            .context("Invalid detector configuration")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse config JSON")
    }

    /// Apply `TREMOR_*` overrides from `lookup` (the process environment in `load`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parsed(&lookup, "TREMOR_INTERVAL_SECS") {
            self.detector.sampling_interval_seconds = v;
        }
        if let Some(v) = parsed(&lookup, "TREMOR_THRESHOLD") {
            self.detector.vibration_threshold = v;
        }
        if let Some(v) = parsed(&lookup, "TREMOR_COOLDOWN_SECS") {
            self.detector.cooldown_seconds = v;
        }
        if let Some(v) = lookup("TREMOR_OUTPUT_ROOT") {
            self.detector.output_root = PathBuf::from(v);
        }
        if let Some(v) = parsed(&lookup, "TREMOR_I2C_BUS") {
            self.sensor.bus = Some(v);
        }
        if let Some(v) = lookup("TREMOR_CAMERA_PROGRAM") {
            self.camera.program = Some(v);
        }
        if let Some(v) = parsed(&lookup, "TREMOR_CAMERA_WIDTH") {
            self.camera.width = Some(v);
        }
        if let Some(v) = parsed(&lookup, "TREMOR_CAMERA_HEIGHT") {
            self.camera.height = Some(v);
        }
        if let Some(v) = lookup("TREMOR_SIMULATE") {
            self.simulate = v == "1" || v.to_lowercase() == "true";
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}
