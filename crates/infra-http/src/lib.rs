// Homewatch Infrastructure - HTTP Adapters
// Implements: Notifier (Twilio), Remediator (plug REST bridge), MetricsSink (JSON push)

pub mod client;
pub mod metrics;
pub mod plug;
pub mod twilio;

#[cfg(test)]
mod test_server;

pub use client::{build_client, DEFAULT_HTTP_TIMEOUT};
pub use metrics::HttpMetricsSink;
pub use plug::HttpPlugRemediator;
pub use twilio::{TwilioCredentials, TwilioNotifier};
