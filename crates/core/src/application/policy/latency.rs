// Latency metrics policy
use super::TransitionPolicy;
use crate::application::monitor::CycleObservation;
use crate::domain::Target;
use crate::port::{LatencyDatum, MetricsSink, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Last measurement of a probed address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyState {
    pub last_latency_ms: Option<f64>,
    pub consecutive_failures: u32,
}

/// Collects round-trip times and pushes them as one batch per cycle
pub struct LatencyPolicy {
    sink: Arc<dyn MetricsSink>,
    namespace: String,
}

impl LatencyPolicy {
    pub fn new(sink: Arc<dyn MetricsSink>, namespace: impl Into<String>) -> Self {
        Self {
            sink,
            namespace: namespace.into(),
        }
    }

    fn to_datum(observation: &CycleObservation) -> Option<LatencyDatum> {
        let result = &observation.result;
        if !result.reachable {
            return None;
        }
        Some(LatencyDatum {
            hostname: observation.address.as_str().to_string(),
            ip: result.resolved_ip.clone(),
            latency_ms: result.latency_ms?,
        })
    }
}

#[async_trait]
impl TransitionPolicy for LatencyPolicy {
    type State = LatencyState;

    async fn evaluate(&self, target: &Target, observation: &ProbeResult, state: &mut LatencyState) {
        if observation.reachable {
            state.last_latency_ms = observation.latency_ms;
            state.consecutive_failures = 0;
            debug!(target = %target.name, latency_ms = ?observation.latency_ms, "Ping answered");
        } else {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            info!(
                target = %target.name,
                consecutive_failures = state.consecutive_failures,
                "Ping unanswered"
            );
        }
    }

    async fn finish_cycle(&self, observations: &[CycleObservation]) {
        let datums: Vec<LatencyDatum> = observations.iter().filter_map(Self::to_datum).collect();
        if datums.is_empty() {
            debug!(namespace = %self.namespace, "No latency samples to submit");
            return;
        }

        info!(namespace = %self.namespace, samples = datums.len(), "Submitting ping data");
        if let Err(e) = self.sink.push(&self.namespace, &datums).await {
            error!(namespace = %self.namespace, error = %e, "Failed to send latency metrics");
        }
    }
}
