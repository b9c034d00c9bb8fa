// Remediation transition policy (smart plug power-cycling)
use super::{Hysteresis, TransitionPolicy};
use crate::application::constants::DEFAULT_POWER_CYCLE_PAUSE;
use crate::domain::{DeviceHandle, Target};
use crate::port::{PowerState, ProbeResult, Remediator};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Hysteresis state of a remediation-capable target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationState {
    pub consecutive_offline: u32,
    /// The plug was power-cycled and connectivity has not returned yet
    pub in_recovery: bool,
    pub consecutive_recovery: u32,
}

/// What the transition table asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationAction {
    /// Reachable: make sure the plug is on
    EnsureOn,
    /// Offline, below threshold
    None,
    /// Offline too long: OFF, then ON
    PowerCycle,
    /// In recovery, still within the window
    Wait,
    /// Recovery took too long: OFF and give up
    Abandon,
}

impl RemediationState {
    /// Apply one reachability observation
    ///
    /// | reachable | in recovery | offline too long | recovery too long | action     |
    /// |-----------|-------------|------------------|-------------------|------------|
    /// | yes       | -           | -                | -                 | EnsureOn   |
    /// | no        | no          | no               | -                 | None       |
    /// | no        | no          | yes              | -                 | PowerCycle |
    /// | no        | yes         | -                | no                | Wait       |
    /// | no        | yes         | -                | yes               | Abandon    |
    pub fn observe(&mut self, reachable: bool, hysteresis: &Hysteresis) -> RemediationAction {
        if reachable {
            *self = Self::default();
            return RemediationAction::EnsureOn;
        }

        self.consecutive_offline = self.consecutive_offline.saturating_add(1);

        if self.in_recovery {
            self.consecutive_recovery = self.consecutive_recovery.saturating_add(1);
            if hysteresis.recovery_too_long(self.consecutive_recovery) {
                self.in_recovery = false;
                self.consecutive_recovery = 0;
                return RemediationAction::Abandon;
            }
            return RemediationAction::Wait;
        }

        if hysteresis.offline_too_long(self.consecutive_offline) {
            self.in_recovery = true;
            self.consecutive_recovery = 0;
            return RemediationAction::PowerCycle;
        }
        RemediationAction::None
    }
}

/// Power-cycles the plug tied to a target when connectivity stays down
pub struct RemediationPolicy {
    remediator: Arc<dyn Remediator>,
    hysteresis: Hysteresis,
    power_cycle_pause: Duration,
}

impl RemediationPolicy {
    pub fn new(remediator: Arc<dyn Remediator>, hysteresis: Hysteresis) -> Self {
        Self {
            remediator,
            hysteresis,
            power_cycle_pause: DEFAULT_POWER_CYCLE_PAUSE,
        }
    }

    /// Pause between OFF and ON during a power-cycle
    pub fn with_power_cycle_pause(mut self, pause: Duration) -> Self {
        self.power_cycle_pause = pause;
        self
    }

    async fn query(&self, handle: &DeviceHandle) -> Option<PowerState> {
        match self.remediator.get_state(handle).await {
            Ok(state) => {
                info!(plug = %handle, state = %state, "Plug state queried");
                Some(state)
            }
            Err(e) => {
                warn!(plug = %handle, error = %e, "Failed to query plug state");
                None
            }
        }
    }

    async fn command(&self, handle: &DeviceHandle, state: PowerState) {
        match self.remediator.set_state(handle, state).await {
            Ok(()) => info!(plug = %handle, state = %state, "Plug state set"),
            Err(e) => error!(plug = %handle, state = %state, error = %e, "Failed to set plug state"),
        }
    }
}

#[async_trait]
impl TransitionPolicy for RemediationPolicy {
    type State = RemediationState;

    async fn evaluate(
        &self,
        target: &Target,
        observation: &ProbeResult,
        state: &mut RemediationState,
    ) {
        let Some(handle) = target.remediation.as_ref() else {
            error!(target = %target.name, "Target has no plug to remediate with");
            return;
        };

        // Query first: the plug may have drifted from what we last commanded
        let plug = self.query(handle).await;

        match state.observe(observation.reachable, &self.hysteresis) {
            RemediationAction::EnsureOn => match plug {
                Some(PowerState::On) => {
                    info!(target = %target.name, address = %target.address, "Able to reach target");
                }
                Some(PowerState::Off) => {
                    warn!(
                        target = %target.name,
                        plug = %handle,
                        "Target reachable but plug reports off, trusting fresh state and turning plug on"
                    );
                    self.command(handle, PowerState::On).await;
                }
                None => self.command(handle, PowerState::On).await,
            },
            RemediationAction::None => {
                info!(
                    target = %target.name,
                    minutes = self.hysteresis.minutes(state.consecutive_offline),
                    "Unable to reach target"
                );
            }
            RemediationAction::PowerCycle => {
                warn!(
                    target = %target.name,
                    minutes = self.hysteresis.minutes(state.consecutive_offline),
                    "Connectivity down too long, power-cycling plug"
                );
                if plug != Some(PowerState::Off) {
                    self.command(handle, PowerState::Off).await;
                    tokio::time::sleep(self.power_cycle_pause).await;
                }
                self.command(handle, PowerState::On).await;
            }
            RemediationAction::Wait => {
                info!(
                    target = %target.name,
                    recovery_minutes = self.hysteresis.minutes(state.consecutive_recovery),
                    "Plug in recovery, waiting for connectivity"
                );
            }
            RemediationAction::Abandon => {
                warn!(
                    target = %target.name,
                    "Connectivity recovery taking too long, turning plug off"
                );
                self.command(handle, PowerState::Off).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HostAddress;
    use crate::port::remediator::mocks::FakePlug;
    use crate::port::remediator::MockRemediator;
    use mockall::Sequence;

    fn uplink() -> Target {
        Target::new("uplink", HostAddress::parse("8.8.8.8").unwrap())
            .with_remediation(DeviceHandle::new("192.168.1.60"))
    }

    fn policy(remediator: Arc<dyn Remediator>) -> RemediationPolicy {
        RemediationPolicy::new(remediator, Hysteresis::default())
            .with_power_cycle_pause(Duration::ZERO)
    }

    #[test]
    fn test_state_machine_full_recovery_window() {
        let h = Hysteresis::default();
        let mut state = RemediationState::default();

        for _ in 0..4 {
            assert_eq!(state.observe(false, &h), RemediationAction::None);
        }
        assert_eq!(state.observe(false, &h), RemediationAction::PowerCycle);
        assert!(state.in_recovery);

        for _ in 0..10 {
            assert_eq!(state.observe(false, &h), RemediationAction::Wait);
        }
        assert_eq!(state.observe(false, &h), RemediationAction::Abandon);
        assert!(!state.in_recovery);
        assert_eq!(state.consecutive_recovery, 0);

        // Still past the offline threshold: the next cycle tries again
        assert_eq!(state.observe(false, &h), RemediationAction::PowerCycle);
    }

    #[test]
    fn test_reachable_clears_everything() {
        let h = Hysteresis::default();
        let mut state = RemediationState {
            consecutive_offline: 9,
            in_recovery: true,
            consecutive_recovery: 3,
        };
        assert_eq!(state.observe(true, &h), RemediationAction::EnsureOn);
        assert_eq!(state, RemediationState::default());
    }

    #[tokio::test]
    async fn test_power_cycle_is_off_then_on() {
        let mut remediator = MockRemediator::new();
        let mut seq = Sequence::new();
        remediator
            .expect_get_state()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PowerState::On));
        remediator
            .expect_set_state()
            .withf(|_, state| *state == PowerState::Off)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        remediator
            .expect_set_state()
            .withf(|_, state| *state == PowerState::On)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let policy = policy(Arc::new(remediator));
        let mut state = RemediationState {
            consecutive_offline: 4,
            ..Default::default()
        };

        policy
            .evaluate(&uplink(), &ProbeResult::unreachable(), &mut state)
            .await;

        assert!(state.in_recovery);
    }

    #[tokio::test]
    async fn test_contradiction_turns_plug_back_on() {
        let plug = Arc::new(FakePlug::new());
        plug.force_state("192.168.1.60", PowerState::Off);
        let policy = policy(plug.clone());
        let mut state = RemediationState::default();

        policy
            .evaluate(&uplink(), &ProbeResult::reachable(Some(12.0)), &mut state)
            .await;

        assert_eq!(
            plug.commands(),
            vec![("192.168.1.60".to_string(), PowerState::On)]
        );
        assert_eq!(plug.state("192.168.1.60"), PowerState::On);
    }

    #[tokio::test]
    async fn test_reachable_with_plug_on_sends_nothing() {
        let plug = Arc::new(FakePlug::new());
        let policy = policy(plug.clone());
        let mut state = RemediationState::default();

        policy
            .evaluate(&uplink(), &ProbeResult::reachable(Some(12.0)), &mut state)
            .await;

        assert!(plug.commands().is_empty());
    }

    #[tokio::test]
    async fn test_failed_query_still_power_cycles() {
        let plug = Arc::new(FakePlug::new());
        plug.set_fail_queries(true);
        let policy = policy(plug.clone());
        let mut state = RemediationState {
            consecutive_offline: 4,
            ..Default::default()
        };

        policy
            .evaluate(&uplink(), &ProbeResult::unreachable(), &mut state)
            .await;

        assert_eq!(
            plug.commands(),
            vec![
                ("192.168.1.60".to_string(), PowerState::Off),
                ("192.168.1.60".to_string(), PowerState::On),
            ]
        );
        assert!(state.in_recovery);
    }

    #[tokio::test]
    async fn test_plug_already_off_is_only_turned_on() {
        let plug = Arc::new(FakePlug::new());
        plug.force_state("192.168.1.60", PowerState::Off);
        let policy = policy(plug.clone());
        let mut state = RemediationState {
            consecutive_offline: 4,
            ..Default::default()
        };

        policy
            .evaluate(&uplink(), &ProbeResult::unreachable(), &mut state)
            .await;

        assert_eq!(
            plug.commands(),
            vec![("192.168.1.60".to_string(), PowerState::On)]
        );
    }
}
