//! Synthetic accelerometer
//!
//! Gravity on Z with a little deterministic jitter, plus a burst of shocks
//! every `shock_every` reads. Lets the detector run on a desk without a Pi.

use tracing::debug;

use super::SampleSource;
use crate::error::SensorReadError;
use crate::sample::Sample;

/// Configuration for the simulated sensor
#[derive(Debug, Clone)]
pub struct SimulatedSensorConfig {
    /// Reads between the start of consecutive shock bursts
    pub shock_every: u64,
    /// Length of a shock burst in reads
    pub shock_len: u64,
    /// Peak acceleration added on every axis during a burst (m/s²)
    pub shock_amplitude: f64,
    /// Peak jitter on every axis outside bursts (m/s²)
    pub noise_amplitude: f64,
}

impl Default for SimulatedSensorConfig {
    fn default() -> Self {
        Self {
            shock_every: 100, // every ~10s at 10 Hz
            shock_len: 5,
            shock_amplitude: 6.0,
            noise_amplitude: 0.05,
        }
    }
}

/// Deterministic fake accelerometer.
pub struct SimulatedSensor {
    config: SimulatedSensorConfig,
    reads: u64,
    rng: u64,
}

impl SimulatedSensor {
    pub fn new(config: SimulatedSensorConfig) -> Self {
        Self {
            config,
            reads: 0,
            rng: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// xorshift64, mapped to [-1, 1)
    fn jitter(&mut self) -> f64 {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        (self.rng >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    fn in_shock(&self) -> bool {
        let every = self.config.shock_every.max(1);
        self.reads % every >= every - self.config.shock_len.min(every)
    }

    pub fn next_sample(&mut self) -> Sample {
        let noise = self.config.noise_amplitude;
        let mut sample = Sample {
            x: self.jitter() * noise,
            y: self.jitter() * noise,
            z: 9.80665 + self.jitter() * noise,
        };
        if self.in_shock() {
            let a = self.config.shock_amplitude;
            sample.x += a;
            sample.y += a;
            sample.z += a;
            debug!("Simulated shock at read {}", self.reads);
        }
        self.reads += 1;
        sample
    }
}

#[async_trait::async_trait]
impl SampleSource for SimulatedSensor {
    async fn read_acceleration(&mut self) -> Result<Sample, SensorReadError> {
        Ok(self.next_sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_reads_stay_near_gravity() {
        let mut sensor = SimulatedSensor::new(SimulatedSensorConfig::default());
        for _ in 0..90 {
            let m = sensor.next_sample().magnitude();
            assert!((m - 9.80665).abs() < 0.2, "magnitude={m}");
        }
    }

    #[test]
    fn shocks_cross_default_threshold() {
        let config = SimulatedSensorConfig {
            shock_every: 10,
            shock_len: 2,
            ..Default::default()
        };
        let mut sensor = SimulatedSensor::new(config);
        let above: Vec<bool> = (0..20).map(|_| sensor.next_sample().magnitude() > 10.0).collect();
        assert_eq!(above.iter().filter(|&&a| a).count(), 4);
        assert!(above[8] && above[9] && above[18] && above[19]);
    }

    #[test]
    fn jitter_is_bounded() {
        let mut sensor = SimulatedSensor::new(SimulatedSensorConfig::default());
        for _ in 0..1000 {
            let j = sensor.jitter();
            assert!((-1.0..1.0).contains(&j), "jitter={j}");
        }
    }
}
