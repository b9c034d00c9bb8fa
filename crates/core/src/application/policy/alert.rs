// Alert-only transition policy
use super::{Hysteresis, TransitionPolicy};
use crate::application::dispatch::Dispatcher;
use crate::domain::Target;
use crate::port::{ProbeResult, TimeProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Hysteresis state of an alert-only target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    pub consecutive_offline: u32,
    /// An offline alert fired and no recovery alert has cleared it yet
    pub alerted: bool,
}

/// What the transition table asks for
#[derive(Debug, Clone, PartialEq)]
pub enum AlertAction {
    None,
    NotifyOffline { minutes: f64 },
    NotifyOnline,
}

impl AlertState {
    /// Apply one reachability observation
    ///
    /// | reachable | offline too long | alerted | action         |
    /// |-----------|------------------|---------|----------------|
    /// | yes       | -                | yes     | NotifyOnline   |
    /// | yes       | -                | no      | None           |
    /// | no        | yes              | no      | NotifyOffline  |
    /// | no        | yes              | yes     | None           |
    /// | no        | no               | -       | None           |
    pub fn observe(&mut self, reachable: bool, hysteresis: &Hysteresis) -> AlertAction {
        if reachable {
            self.consecutive_offline = 0;
            if self.alerted {
                self.alerted = false;
                return AlertAction::NotifyOnline;
            }
            return AlertAction::None;
        }

        self.consecutive_offline = self.consecutive_offline.saturating_add(1);
        if hysteresis.offline_too_long(self.consecutive_offline) && !self.alerted {
            self.alerted = true;
            return AlertAction::NotifyOffline {
                minutes: hysteresis.minutes(self.consecutive_offline),
            };
        }
        AlertAction::None
    }
}

/// Body of the offline alert (without timestamp)
pub fn offline_message(target: &Target, minutes: f64) -> String {
    match &target.offline_message {
        Some(custom) => format!("{} {} minutes ago", custom, minutes),
        None => format!(
            "The device, '{}' has been offline for {} minutes!",
            target.name, minutes
        ),
    }
}

/// Body of the recovery alert (without timestamp)
pub fn online_message(target: &Target) -> String {
    match &target.online_message {
        Some(custom) => custom.clone(),
        None => format!("The device, '{}' has come back online!", target.name),
    }
}

/// Sends text alerts when a target crosses the offline threshold and when it returns
pub struct AlertPolicy {
    dispatcher: Dispatcher,
    time_provider: Arc<dyn TimeProvider>,
    hysteresis: Hysteresis,
}

impl AlertPolicy {
    pub fn new(
        dispatcher: Dispatcher,
        time_provider: Arc<dyn TimeProvider>,
        hysteresis: Hysteresis,
    ) -> Self {
        Self {
            dispatcher,
            time_provider,
            hysteresis,
        }
    }

    pub fn hysteresis(&self) -> &Hysteresis {
        &self.hysteresis
    }

    async fn announce(&self, body: String) {
        let message = format!("{} - {}", self.time_provider.timestamp(), body);
        let report = self.dispatcher.broadcast(&message, None).await;
        info!(
            delivered = report.delivered,
            failed = report.failed,
            "{}",
            message
        );
    }
}

#[async_trait]
impl TransitionPolicy for AlertPolicy {
    type State = AlertState;

    async fn evaluate(&self, target: &Target, observation: &ProbeResult, state: &mut AlertState) {
        match state.observe(observation.reachable, &self.hysteresis) {
            AlertAction::NotifyOffline { minutes } => {
                warn!(
                    target = %target.name,
                    consecutive_offline = state.consecutive_offline,
                    minutes,
                    "Network device offline too long, alerting"
                );
                self.announce(offline_message(target, minutes)).await;
            }
            AlertAction::NotifyOnline => {
                info!(target = %target.name, "Network device came back online, alerting");
                self.announce(online_message(target)).await;
            }
            AlertAction::None if observation.reachable => {
                info!(target = %target.name, "Network device is online");
            }
            AlertAction::None => {
                info!(
                    target = %target.name,
                    consecutive_offline = state.consecutive_offline,
                    alerted = state.alerted,
                    "Network device is offline"
                );
            }
        }
    }
}
