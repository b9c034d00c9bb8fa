//! Device Monitor Loop - one polling cycle over a registry of targets
//!
//! Per cycle:
//! 1. Probe every target concurrently (bounded by a per-probe timeout)
//! 2. Feed each observation through the policy's per-target state machine
//! 3. Wait for every target to settle, then store the updated states
//! 4. Give the policy one look at the whole cycle (metrics batching)
//!
//! Each target's state is moved into its own future for the cycle, so no lock
//! is held across awaits and no target can touch another target's state.
//!
//! Cycles of one monitor never overlap: a `run_cycle` call made while another
//! is in flight returns an empty report without probing. [`RepeatingTask`]
//! already skips such triggers; the check here covers direct callers.
//!
//! [`RepeatingTask`]: super::scheduler::RepeatingTask

use super::panic_guard::{execute_guarded_async, PanicGuardResult};
use super::policy::TransitionPolicy;
use super::scheduler::{Cycle, CycleReport};
use crate::application::constants::DEFAULT_PROBE_TIMEOUT;
use crate::domain::{HostAddress, Target, TargetRegistry};
use crate::port::{Probe, ProbeResult};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// A target's probe result as seen at the end of a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleObservation {
    pub target_name: String,
    pub address: HostAddress,
    pub result: ProbeResult,
}

enum TargetOutcome<S> {
    Evaluated { state: S, result: ProbeResult },
    /// Probe failed with an error; state untouched
    Skipped { state: S },
}

/// Generic monitor loop, parameterized over a transition policy
///
/// Drive it through a `RepeatingTask`; overlapping `run_cycle` calls are
/// refused, not queued.
pub struct Monitor<P: TransitionPolicy> {
    name: String,
    registry: TargetRegistry,
    probe: Arc<dyn Probe>,
    policy: P,
    probe_timeout: Duration,
    states: Mutex<HashMap<String, P::State>>,
    /// Held for the whole cycle
    cycle_gate: Mutex<()>,
}

impl<P: TransitionPolicy> Monitor<P> {
    /// Create a new monitor
    ///
    /// # Arguments
    /// * `name` - Monitor name used in logs (e.g. "ip-checker")
    /// * `registry` - Targets to probe every cycle
    /// * `probe` - Reachability probe
    /// * `policy` - What to do with each observation
    pub fn new(
        name: impl Into<String>,
        registry: TargetRegistry,
        probe: Arc<dyn Probe>,
        policy: P,
    ) -> Self {
        Self {
            name: name.into(),
            registry,
            probe,
            policy,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            states: Mutex::new(HashMap::new()),
            cycle_gate: Mutex::new(()),
        }
    }

    /// A probe still pending after `probe_timeout` counts as unreachable
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Snapshot of a target's state (None before its first observation)
    pub async fn state_of(&self, target: &str) -> Option<P::State> {
        self.states.lock().await.get(target).cloned()
    }

    async fn observe(&self, target: &Target) -> Option<ProbeResult> {
        match timeout(self.probe_timeout, self.probe.probe(&target.address)).await {
            Ok(Ok(result)) => Some(result),
            Ok(Err(e)) => {
                error!(
                    monitor = %self.name,
                    target = %target.name,
                    address = %target.address,
                    error = %e,
                    "Probe failed, skipping target this cycle"
                );
                None
            }
            Err(_) => {
                warn!(
                    monitor = %self.name,
                    target = %target.name,
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "Probe timed out, treating target as unreachable"
                );
                Some(ProbeResult::unreachable())
            }
        }
    }

    async fn evaluate_target(&self, target: &Target, mut state: P::State) -> TargetOutcome<P::State> {
        let Some(result) = self.observe(target).await else {
            return TargetOutcome::Skipped { state };
        };
        self.policy.evaluate(target, &result, &mut state).await;
        TargetOutcome::Evaluated { state, result }
    }
}

#[async_trait]
impl<P: TransitionPolicy> Cycle for Monitor<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_cycle(&self) -> CycleReport {
        let Ok(_cycle) = self.cycle_gate.try_lock() else {
            warn!(monitor = %self.name, "Cycle already in progress, refusing to overlap");
            return CycleReport::default();
        };

        let mut previous = std::mem::take(&mut *self.states.lock().await);

        let evaluations = self.registry.iter().map(|target| {
            let state = previous.remove(&target.name).unwrap_or_default();
            let fallback = state.clone();
            async move {
                let outcome = execute_guarded_async(self.evaluate_target(target, state)).await;
                (target, outcome, fallback)
            }
        });
        let outcomes = join_all(evaluations).await;

        let mut report = CycleReport::default();
        let mut observations = Vec::with_capacity(outcomes.len());
        let mut next = HashMap::with_capacity(outcomes.len());

        for (target, outcome, fallback) in outcomes {
            let state = match outcome {
                PanicGuardResult::Success(TargetOutcome::Evaluated { state, result }) => {
                    report.evaluated += 1;
                    observations.push(CycleObservation {
                        target_name: target.name.clone(),
                        address: target.address.clone(),
                        result,
                    });
                    state
                }
                PanicGuardResult::Success(TargetOutcome::Skipped { state }) => {
                    report.skipped += 1;
                    state
                }
                PanicGuardResult::Panicked(msg) => {
                    error!(
                        monitor = %self.name,
                        target = %target.name,
                        panic_msg = %msg,
                        "Target evaluation panicked, keeping previous state"
                    );
                    report.skipped += 1;
                    fallback
                }
            };
            next.insert(target.name.clone(), state);
        }

        *self.states.lock().await = next;

        self.policy.finish_cycle(&observations).await;

        info!(
            monitor = %self.name,
            evaluated = report.evaluated,
            skipped = report.skipped,
            "Monitoring cycle finished"
        );
        report
    }
}
