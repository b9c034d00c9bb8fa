// Metrics Sink Port (ping latency)
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// One latency sample for a probed host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyDatum {
    /// Address as configured (hostname or IP)
    pub hostname: String,
    /// Numeric address that answered, when known
    pub ip: Option<String>,
    pub latency_ms: f64,
}

#[derive(Error, Debug, Clone)]
pub enum MetricsError {
    #[error("Metrics backend rejected batch (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Receives one batch of latency datums per cycle
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn push(&self, namespace: &str, datums: &[LatencyDatum]) -> Result<(), MetricsError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Mock sink that records every pushed batch
    pub struct RecordingMetricsSink {
        batches: Mutex<Vec<(String, Vec<LatencyDatum>)>>,
        fail: AtomicBool,
    }

    impl RecordingMetricsSink {
        pub fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }

        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn batches(&self) -> Vec<(String, Vec<LatencyDatum>)> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl Default for RecordingMetricsSink {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl MetricsSink for RecordingMetricsSink {
        async fn push(&self, namespace: &str, datums: &[LatencyDatum]) -> Result<(), MetricsError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MetricsError::Transport("mock push failure".to_string()));
            }
            self.batches
                .lock()
                .unwrap()
                .push((namespace.to_string(), datums.to_vec()));
            Ok(())
        }
    }
}
