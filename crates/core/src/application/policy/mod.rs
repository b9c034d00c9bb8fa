//! Transition policies - what a monitor does with each observation
//!
//! One generic [`Monitor`](super::Monitor) drives every variant:
//! - [`AlertPolicy`]: text alerts on offline/online transitions
//! - [`RemediationPolicy`]: power-cycles a smart plug tied to the target
//! - [`LatencyPolicy`]: pushes round-trip times as metrics

mod alert;
mod latency;
mod remediation;

pub use alert::{offline_message, online_message, AlertAction, AlertPolicy, AlertState};
pub use latency::{LatencyPolicy, LatencyState};
pub use remediation::{RemediationAction, RemediationPolicy, RemediationState};

use super::constants::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_OFFLINE_THRESHOLD, DEFAULT_RECOVERY_THRESHOLD,
    MILLIS_PER_MINUTE,
};
use super::monitor::CycleObservation;
use crate::domain::Target;
use crate::port::ProbeResult;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Per-target state machine plugged into a monitor
#[async_trait]
pub trait TransitionPolicy: Send + Sync {
    /// Per-target state, created with `Default` on first observation
    type State: Default + Clone + Debug + Send + Sync + 'static;

    /// Apply one observation to `state` and perform the resulting actions
    ///
    /// Must not fail: port errors are logged inside.
    async fn evaluate(&self, target: &Target, observation: &ProbeResult, state: &mut Self::State);

    /// Called once after every target of the cycle has been evaluated
    async fn finish_cycle(&self, _observations: &[CycleObservation]) {}
}

/// Hysteresis thresholds, counted in cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hysteresis {
    /// Act once the offline streak is strictly greater than this
    pub offline_threshold: u32,
    /// Give up recovery once the recovery streak is strictly greater than this
    pub recovery_threshold: u32,
    /// Cycle interval, used to express streaks in minutes
    pub interval: Duration,
}

impl Hysteresis {
    pub fn offline_too_long(&self, consecutive_offline: u32) -> bool {
        consecutive_offline > self.offline_threshold
    }

    pub fn recovery_too_long(&self, consecutive_recovery: u32) -> bool {
        consecutive_recovery > self.recovery_threshold
    }

    /// Streak length in minutes (fractional, not rounded)
    pub fn minutes(&self, cycles: u32) -> f64 {
        cycles as f64 * self.interval.as_millis() as f64 / MILLIS_PER_MINUTE
    }
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self {
            offline_threshold: DEFAULT_OFFLINE_THRESHOLD,
            recovery_threshold: DEFAULT_RECOVERY_THRESHOLD,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}
