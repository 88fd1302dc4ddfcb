//! ADXL345 accelerometer over Linux i2c-dev
//!
//! Talks to `/dev/i2c-<bus>` directly: bind the slave address with the
//! `I2C_SLAVE` ioctl, then plain `write`/`read` on the file descriptor.
//! A register read is a one-byte write of the register address followed by
//! a read; the device auto-increments across multi-byte reads.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use tracing::{debug, info};

use super::SampleSource;
use crate::error::{InitializationError, SensorReadError};
use crate::sample::Sample;

/// `I2C_SLAVE` from `<linux/i2c-dev.h>`
const I2C_SLAVE: u64 = 0x0703;

const REG_DEVID: u8 = 0x00;
const REG_BW_RATE: u8 = 0x2C;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32;

const DEVID: u8 = 0xE5;
/// Measure mode
const POWER_CTL_MEASURE: u8 = 0x08;
/// Full resolution, ±16 g
const DATA_FORMAT_FULL_RES_16G: u8 = 0x0B;
/// 50 Hz output data rate
const BW_RATE_50HZ: u8 = 0x09;

/// Full-resolution scale factor.
const G_PER_LSB: f64 = 0.004;
const STANDARD_GRAVITY: f64 = 9.80665;

/// ADXL345 configuration
#[derive(Debug, Clone)]
pub struct Adxl345Config {
    /// I2C bus number (1 = `/dev/i2c-1` on a Pi)
    pub bus: u8,
    /// 7-bit slave address (0x53 with SDO low, 0x1D with SDO high)
    pub address: u16,
    /// Value written to BW_RATE
    pub rate: u8,
}

impl Default for Adxl345Config {
    fn default() -> Self {
        Self {
            bus: 1,
            address: 0x53,
            rate: BW_RATE_50HZ,
        }
    }
}

impl Adxl345Config {
    pub fn device_path(&self) -> PathBuf {
        PathBuf::from(format!("/dev/i2c-{}", self.bus))
    }
}

/// Handle to an initialized ADXL345.
pub struct Adxl345 {
    file: File,
    config: Adxl345Config,
}

impl Adxl345 {
    /// Open the bus, check the device ID and put the part into measure mode.
    pub fn open(config: Adxl345Config) -> Result<Self, InitializationError> {
        let path = config.device_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| InitializationError::Sensor(format!("failed to open {:?}: {}", path, e)))?;

        // SAFETY: fd is owned by `file` and stays open for the duration of the call
        let rc = unsafe {
            libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, config.address as libc::c_ulong)
        };
        if rc < 0 {
            return Err(InitializationError::Sensor(format!(
                "I2C_SLAVE 0x{:02x} on {:?}: {}",
                config.address,
                path,
                std::io::Error::last_os_error()
            )));
        }

        let mut sensor = Self { file, config };

        let devid = sensor
            .read_register(REG_DEVID)
            .map_err(|e| InitializationError::Sensor(format!("reading DEVID: {}", e)))?;
        if devid != DEVID {
            return Err(InitializationError::Sensor(format!(
                "unexpected DEVID 0x{:02x} (expected 0x{:02x})",
                devid, DEVID
            )));
        }

        let rate = sensor.config.rate;
        for (reg, value) in [
            (REG_POWER_CTL, POWER_CTL_MEASURE),
            (REG_DATA_FORMAT, DATA_FORMAT_FULL_RES_16G),
            (REG_BW_RATE, rate),
        ] {
            sensor.write_register(reg, value).map_err(|e| {
                InitializationError::Sensor(format!("writing register 0x{:02x}: {}", reg, e))
            })?;
        }

        info!(
            "ADXL345 initialized on {:?} at 0x{:02x}",
            path, sensor.config.address
        );
        Ok(sensor)
    }

    pub fn config(&self) -> &Adxl345Config {
        &self.config
    }

    fn write_register(&mut self, reg: u8, value: u8) -> std::io::Result<()> {
        self.file.write_all(&[reg, value])
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, SensorReadError> {
        let mut buf = [0u8; 1];
        self.read_block(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorReadError> {
        self.file.write_all(&[reg])?;
        let n = self.file.read(buf)?;
        if n != buf.len() {
            return Err(SensorReadError::ShortRead {
                expected: buf.len(),
                actual: n,
            });
        }
        Ok(())
    }

    /// Read the three axes and convert to m/s².
    pub fn read_axes(&mut self) -> Result<Sample, SensorReadError> {
        let mut raw = [0u8; 6];
        self.read_block(REG_DATAX0, &mut raw)?;
        let sample = sample_from_raw(&raw);
        debug!("ADXL345 raw {:02x?} -> {:?}", raw, sample);
        Ok(sample)
    }
}

#[async_trait::async_trait]
impl SampleSource for Adxl345 {
    async fn read_acceleration(&mut self) -> Result<Sample, SensorReadError> {
        // Six bytes at 100 kHz is well under a millisecond; no need to leave the runtime thread
        self.read_axes()
    }
}

/// Little-endian signed counts → m/s².
pub fn sample_from_raw(raw: &[u8; 6]) -> Sample {
    let axis = |lo: u8, hi: u8| i16::from_le_bytes([lo, hi]) as f64 * G_PER_LSB * STANDARD_GRAVITY;
    Sample {
        x: axis(raw[0], raw[1]),
        y: axis(raw[2], raw[3]),
        z: axis(raw[4], raw[5]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_path_from_bus() {
        let config = Adxl345Config::default();
        assert_eq!(config.device_path(), PathBuf::from("/dev/i2c-1"));
        assert_eq!(config.address, 0x53);
    }

    #[test]
    fn one_g_on_z() {
        // 250 counts * 4 mg = 1 g
        let raw = [0x00, 0x00, 0x00, 0x00, 0xFA, 0x00];
        let s = sample_from_raw(&raw);
        assert_eq!(s.x, 0.0);
        assert_eq!(s.y, 0.0);
        assert!((s.z - STANDARD_GRAVITY).abs() < 1e-9, "z={}", s.z);
    }

    #[test]
    fn negative_counts_are_sign_extended() {
        // -250 = 0xFF06
        let raw = [0x06, 0xFF, 0x00, 0x00, 0x00, 0x00];
        let s = sample_from_raw(&raw);
        assert!((s.x + STANDARD_GRAVITY).abs() < 1e-9, "x={}", s.x);
    }

    #[test]
    fn extremes() {
        let raw = [0xFF, 0x7F, 0x00, 0x80, 0x00, 0x00];
        let s = sample_from_raw(&raw);
        assert!((s.x - 32767.0 * G_PER_LSB * STANDARD_GRAVITY).abs() < 1e-6);
        assert!((s.y + 32768.0 * G_PER_LSB * STANDARD_GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn open_missing_bus_is_initialization_error() {
        let config = Adxl345Config { bus: 250, ..Default::default() };
        match Adxl345::open(config) {
            Err(InitializationError::Sensor(msg)) => assert!(msg.contains("i2c-250"), "{msg}"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("bus 250 should not exist"),
        }
    }
}
