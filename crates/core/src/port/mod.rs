// Port Layer - Interfaces for external collaborators

pub mod metrics_sink;
pub mod notifier;
pub mod page;
pub mod probe;
pub mod remediator;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use metrics_sink::{LatencyDatum, MetricsError, MetricsSink};
pub use notifier::{NotifyError, Notifier};
pub use page::{PageCapturer, PageError, ScreenshotStore, TextDetector};
pub use probe::{Probe, ProbeError, ProbeResult};
pub use remediator::{PowerState, RemediationError, Remediator};
pub use time_provider::TimeProvider;
