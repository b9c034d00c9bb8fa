// Reachability Probe Port
// reason: async-trait required for dyn dispatch of async methods
use crate::domain::HostAddress;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Outcome of one reachability check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub reachable: bool,
    /// Round-trip time, when the probe could measure one
    pub latency_ms: Option<f64>,
    /// Numeric address the probe actually contacted (after DNS resolution)
    pub resolved_ip: Option<String>,
}

impl ProbeResult {
    pub fn reachable(latency_ms: Option<f64>) -> Self {
        Self {
            reachable: true,
            latency_ms,
            resolved_ip: None,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            latency_ms: None,
            resolved_ip: None,
        }
    }

    pub fn with_resolved_ip(mut self, ip: impl Into<String>) -> Self {
        self.resolved_ip = Some(ip.into());
        self
    }
}

/// Probe errors
///
/// Ordinary unreachability is NOT an error; it is `Ok(ProbeResult::unreachable())`.
#[derive(Error, Debug, Clone)]
pub enum ProbeError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Probe tool unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Probe port: "is this address reachable right now"
#[async_trait]
pub trait Probe: Send + Sync {
    /// Check reachability of `address`
    ///
    /// # Errors
    /// Only configuration-type failures (malformed or unresolvable address,
    /// missing probe tool). An unreachable host returns `Ok`.
    async fn probe(&self, address: &HostAddress) -> Result<ProbeResult, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Semaphore;

    /// Scripted answer of the mock probe
    #[derive(Debug, Clone)]
    pub enum ScriptedReply {
        /// Reachable with the given latency (ms)
        Up(f64),
        /// Unreachable
        Down,
        /// Probe error (configuration-type failure)
        Error(String),
        /// Panic inside the probe (for panic isolation testing)
        Panic(String),
    }

    /// Mock probe answering from a per-address script
    ///
    /// The last scripted reply for an address repeats once the script runs out.
    /// Unscripted addresses are reachable with 1ms latency.
    pub struct ScriptedProbe {
        scripts: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
        calls: Mutex<Vec<String>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedProbe {
        pub fn new() -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        /// Every probe waits for a permit of `gate` before answering
        pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn script(&self, address: &str, replies: impl IntoIterator<Item = ScriptedReply>) {
            self.scripts
                .lock()
                .unwrap()
                .insert(address.to_string(), replies.into_iter().collect());
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_for(&self, address: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.as_str() == address)
                .count()
        }

        fn next_reply(&self, address: &str) -> ScriptedReply {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(address) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(ScriptedReply::Down),
                Some(queue) => queue.front().cloned().unwrap_or(ScriptedReply::Up(1.0)),
                None => ScriptedReply::Up(1.0),
            }
        }
    }

    impl Default for ScriptedProbe {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn probe(&self, address: &HostAddress) -> Result<ProbeResult, ProbeError> {
            self.calls.lock().unwrap().push(address.as_str().to_string());

            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            // Lock released before acting so a scripted panic cannot poison it
            let reply = self.next_reply(address.as_str());
            match reply {
                ScriptedReply::Up(latency) => Ok(ProbeResult::reachable(Some(latency))
                    .with_resolved_ip(address.as_str())),
                ScriptedReply::Down => Ok(ProbeResult::unreachable()),
                ScriptedReply::Error(msg) => Err(ProbeError::InvalidAddress(msg)),
                ScriptedReply::Panic(msg) => panic!("{}", msg),
            }
        }
    }
}
