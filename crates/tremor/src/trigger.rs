//! Threshold trigger with hard cooldown
//!
//! Decides, one magnitude at a time, whether a vibration event fires:
//! - Idle: a magnitude strictly above the threshold fires and starts cooldown
//! - Cooldown: nothing fires, whatever the magnitude
//! - Cooldown clears on the first evaluation after the deadline has passed,
//!   and that evaluation still does not fire
//!
//! There is no hysteresis and no averaging. A sustained disturbance sampled
//! at 10 Hz produces one event per cooldown window, not one per sample.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Longest cooldown a controller will apply.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// Current state of the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Cooldown { until: Instant },
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerState::Idle => write!(f, "Idle"),
            TriggerState::Cooldown { .. } => write!(f, "Cooldown"),
        }
    }
}

/// Decision returned for one evaluated magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Idle and at or below threshold.
    Hold,
    /// Idle → Cooldown. The caller dispatches an event.
    Fire,
    /// In cooldown, deadline not yet passed.
    Suppressed { above_threshold: bool },
    /// Cooldown deadline passed; back to Idle without firing this tick.
    Rearmed,
}

/// Idle/Cooldown state machine.
pub struct TriggerController {
    state: TriggerState,
    threshold: f64,
    cooldown: Duration,
}

impl TriggerController {
    /// `cooldown` is capped at [`MAX_COOLDOWN`].
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            state: TriggerState::Idle,
            threshold,
            cooldown: cooldown.min(MAX_COOLDOWN),
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_idle(&self) -> bool {
        self.state == TriggerState::Idle
    }

    /// Evaluate one magnitude observed at `now`.
    pub fn evaluate(&mut self, magnitude: f64, now: Instant) -> TriggerDecision {
        let above = magnitude > self.threshold;

        match self.state {
            TriggerState::Cooldown { until } => {
                if now > until {
                    debug!("Cooldown over, re-armed");
                    self.state = TriggerState::Idle;
                    TriggerDecision::Rearmed
                } else {
                    if above {
                        debug!(
                            "Suppressed {:.3} (cooldown {:.1}s remaining)",
                            magnitude,
                            until.saturating_duration_since(now).as_secs_f64()
                        );
                    }
                    TriggerDecision::Suppressed { above_threshold: above }
                }
            }
            TriggerState::Idle if above => {
                // An unrepresentable deadline collapses to a one-tick cooldown
                let until = now.checked_add(self.cooldown).unwrap_or(now);
                info!(
                    "Trigger: {:.3} > {:.3}, cooling down for {:.1}s",
                    magnitude,
                    self.threshold,
                    self.cooldown.as_secs_f64()
                );
                self.state = TriggerState::Cooldown { until };
                TriggerDecision::Fire
            }
            TriggerState::Idle => TriggerDecision::Hold,
        }
    }
}
