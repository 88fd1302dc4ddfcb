//! Accelerometer sources
//!
//! - ADXL345 over Linux i2c-dev (`hardware`)
//! - Synthetic shocks for development (`test-source`)

#[cfg(feature = "hardware")]
pub mod adxl345;
#[cfg(feature = "test-source")]
pub mod simulated;

use crate::error::SensorReadError;
use crate::sample::Sample;

/// Something that can be polled for one acceleration reading in m/s².
#[async_trait::async_trait]
pub trait SampleSource: Send {
    async fn read_acceleration(&mut self) -> Result<Sample, SensorReadError>;
}

#[async_trait::async_trait]
impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    async fn read_acceleration(&mut self) -> Result<Sample, SensorReadError> {
        (**self).read_acceleration().await
    }
}

#[cfg(feature = "hardware")]
pub use adxl345::{Adxl345, Adxl345Config};
#[cfg(feature = "test-source")]
pub use simulated::{SimulatedSensor, SimulatedSensorConfig};
