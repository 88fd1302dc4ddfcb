//! Tremor Detector Binary
//!
//! Polls an ADXL345 accelerometer, and on each debounced vibration appends a
//! line to the event log and takes a still with the Pi camera.
//!
//! ## Usage
//!
//! ```bash
//! # Defaults: threshold 10 m/s², 2s cooldown, output in ./vibration_output
//! tremor-detector
//!
//! # Settings from a JSON file, with env overrides on top
//! TREMOR_CONFIG=/etc/tremor.json TREMOR_THRESHOLD=12 tremor-detector
//!
//! # Synthetic accelerometer (build with --features test-source)
//! TREMOR_SIMULATE=1 tremor-detector
//! ```

mod config;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tremor::{Adxl345, EventLogFile, SampleSource, StillCamera, VibrationDetector};

use crate::config::Config;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tremor=info,tremor_detector=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting Vibration Detection System...");
    let config = Config::load()?;
    let layout = config.detector.layout();

    info!(
        "Config: threshold {}, cooldown {}s, interval {}s, output {:?}",
        config.detector.vibration_threshold,
        config.detector.cooldown_seconds,
        config.detector.sampling_interval_seconds,
        layout.root
    );

    let source = open_sensor(&config)?;

    let camera = StillCamera::open(config.camera.to_still_camera(), &layout.picture_dir)
        .await
        .context("Failed to initialize camera")?;

    // Not fatal: the log and camera create what they need on first event
    if let Err(e) = layout.prepare() {
        warn!("Error setting up output directories: {}", e);
    }

    let log = EventLogFile::new(&layout.log_file);
    let mut detector = VibrationDetector::new(config.detector.clone(), source, log, camera)
        .context("Failed to create detector")?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    info!("System initialized. Waiting for vibrations...");
    let stats = detector.run(cancel).await;

    info!(
        "Stats: {} ticks, {} events, {} suppressed, {} read errors, {} log failures, {} capture failures",
        stats.ticks,
        stats.events,
        stats.suppressed,
        stats.read_errors,
        stats.log_failures,
        stats.capture_failures
    );

    let (_, _, mut camera) = detector.into_parts();
    camera.close();
    info!("Program terminated");
    Ok(())
}

fn open_sensor(config: &Config) -> Result<Box<dyn SampleSource>> {
    if config.simulate {
        return open_simulated();
    }

    let sensor = Adxl345::open(config.sensor.to_adxl345())
        .context("Failed to initialize accelerometer")?;
    Ok(Box::new(sensor))
}

#[cfg(feature = "test-source")]
fn open_simulated() -> Result<Box<dyn SampleSource>> {
    use tremor::{SimulatedSensor, SimulatedSensorConfig};

    warn!("Using simulated accelerometer");
    Ok(Box::new(SimulatedSensor::new(SimulatedSensorConfig::default())))
}

#[cfg(not(feature = "test-source"))]
fn open_simulated() -> Result<Box<dyn SampleSource>> {
    anyhow::bail!("TREMOR_SIMULATE needs a build with the test-source feature")
}

/// Cancel on SIGINT or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Received shutdown signal");
    cancel.cancel();
}
