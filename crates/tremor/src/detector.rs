//! The vibration event loop
//!
//! One [`VibrationDetector`] owns the sample source, both sinks and the
//! trigger state. Each tick reads one sample, reduces it to a magnitude and
//! feeds the trigger. On a trigger the event goes to the log first, then to
//! the camera; a failure in either is reported and the loop carries on.
//!
//! Cooldown is not a sleep. The loop keeps sampling at its normal cadence
//! (so sensor faults are still seen) and the trigger suppresses firing until
//! the deadline has passed.

use std::path::PathBuf;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::ImageCaptureSink;
use crate::config::DetectorConfig;
use crate::error::{CaptureError, InitializationError, LogWriteError, SensorReadError};
use crate::event::{Event, EventTimestamp};
use crate::sample::reduce;
use crate::sensor::SampleSource;
use crate::sink::EventLogSink;
use crate::trigger::{TriggerController, TriggerDecision, TriggerState};

/// Counters accumulated over the detector's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorStats {
    /// Ticks attempted, including failed reads
    pub ticks: u64,
    pub read_errors: u64,
    pub events: u64,
    /// Above-threshold samples swallowed by cooldown
    pub suppressed: u64,
    pub log_failures: u64,
    pub capture_failures: u64,
}

/// What happened to one event's two sinks.
#[derive(Debug)]
pub struct DispatchReport {
    pub event: Event,
    pub log: Result<(), LogWriteError>,
    pub capture: Result<PathBuf, CaptureError>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.log.is_ok() && self.capture.is_ok()
    }
}

/// Result of a single tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// Sensor read failed; trigger state untouched.
    ReadFailed(SensorReadError),
    /// Idle, magnitude at or below threshold.
    Quiet { magnitude: f64 },
    /// Cooling down; nothing fires.
    Suppressed { magnitude: f64 },
    /// Cooldown ended on this tick. Nothing fires until the next one.
    CooldownCleared { magnitude: f64 },
    /// Idle → Cooldown; the event was dispatched.
    Triggered(DispatchReport),
}

impl TickOutcome {
    pub fn is_triggered(&self) -> bool {
        matches!(self, TickOutcome::Triggered(_))
    }
}

/// Polls a sample source and dispatches debounced vibration events.
pub struct VibrationDetector<S, L, C> {
    config: DetectorConfig,
    trigger: TriggerController,
    source: S,
    log: L,
    camera: C,
    stats: DetectorStats,
}

impl<S, L, C> VibrationDetector<S, L, C>
where
    S: SampleSource,
    L: EventLogSink,
    C: ImageCaptureSink,
{
    pub fn new(
        config: DetectorConfig,
        source: S,
        log: L,
        camera: C,
    ) -> Result<Self, InitializationError> {
        config.validate()?;
        let trigger = TriggerController::new(config.vibration_threshold, config.cooldown());
        Ok(Self {
            config,
            trigger,
            source,
            log,
            camera,
            stats: DetectorStats::default(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> TriggerState {
        self.trigger.state()
    }

    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    /// Hand back the collaborators, e.g. to close the camera explicitly.
    pub fn into_parts(self) -> (S, L, C) {
        (self.source, self.log, self.camera)
    }

    /// Run one tick at the current instant.
    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Run one tick as if observed at `now`.
    pub async fn tick_at(&mut self, now: Instant) -> TickOutcome {
        self.stats.ticks += 1;

        let sample = match self.source.read_acceleration().await {
            Ok(sample) => sample,
            Err(e) => {
                self.stats.read_errors += 1;
                warn!("Sensor read failed: {}", e);
                return TickOutcome::ReadFailed(e);
            }
        };

        let magnitude = reduce(&sample);

        match self.trigger.evaluate(magnitude, now) {
            TriggerDecision::Hold => TickOutcome::Quiet { magnitude },
            TriggerDecision::Suppressed { above_threshold } => {
                if above_threshold {
                    self.stats.suppressed += 1;
                }
                TickOutcome::Suppressed { magnitude }
            }
            TriggerDecision::Rearmed => TickOutcome::CooldownCleared { magnitude },
            TriggerDecision::Fire => {
                let event = Event {
                    timestamp: EventTimestamp::at(now),
                    magnitude,
                };
                self.stats.events += 1;
                TickOutcome::Triggered(self.dispatch(event).await)
            }
        }
    }

    /// Log first so the record exists even if the camera then fails.
    async fn dispatch(&mut self, event: Event) -> DispatchReport {
        let log = self.log.append(&event).await;
        match &log {
            Ok(()) => info!("Logged vibration: {} at {}", event.magnitude, event.timestamp),
            Err(e) => {
                self.stats.log_failures += 1;
                error!("Error writing to log file: {}", e);
            }
        }

        let capture = self.camera.capture(&event.timestamp).await;
        match &capture {
            Ok(path) => debug!("Event {} captured to {:?}", event.timestamp, path),
            Err(e) => {
                self.stats.capture_failures += 1;
                error!("Error taking picture: {}", e);
            }
        }

        DispatchReport {
            event,
            log,
            capture,
        }
    }

    /// Tick on the configured interval until `cancel` fires.
    ///
    /// Cancellation is observed between ticks; a tick in progress (including
    /// its dispatch) always completes.
    pub async fn run(&mut self, cancel: CancellationToken) -> DetectorStats {
        let mut interval = tokio::time::interval(self.config.sampling_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Waiting for vibrations (threshold {}, every {:.0}ms, cooldown {:.1}s)",
            self.config.vibration_threshold,
            self.config.sampling_interval().as_secs_f64() * 1000.0,
            self.config.cooldown().as_secs_f64()
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Detector stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        self.stats.clone()
    }
}
