// Probe adapter over the system `ping` binary
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::command::{run_command, stderr_text, CommandError};
use homewatch_core::domain::HostAddress;
use homewatch_core::port::{Probe, ProbeError, ProbeResult};

/// Extra time granted to the ping process beyond its own reply wait
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// Sends one ICMP echo request per probe
///
/// Exit status 0 means reachable; any other exit status (no reply, unknown
/// host) means unreachable. Only a missing/unrunnable binary is an error.
pub struct PingProbe {
    ping_path: String,
    wait: Duration,
}

impl PingProbe {
    /// Create a new ping probe
    ///
    /// # Arguments
    /// * `ping_path` - Ping binary (usually just "ping")
    /// * `wait` - How long to wait for the echo reply
    pub fn new(ping_path: impl Into<String>, wait: Duration) -> Self {
        Self {
            ping_path: ping_path.into(),
            wait,
        }
    }

    fn args(&self, address: &HostAddress) -> Vec<String> {
        // Linux takes -W in seconds, macOS in milliseconds
        #[cfg(target_os = "macos")]
        let wait = self.wait.as_millis().max(1).to_string();
        #[cfg(not(target_os = "macos"))]
        let wait = self.wait.as_secs().max(1).to_string();

        vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            wait,
            address.as_str().to_string(),
        ]
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new("ping", Duration::from_secs(5))
    }
}

/// Round-trip time from a `time=12.3 ms` reply line
pub fn parse_latency(output: &str) -> Option<f64> {
    let start = output.find("time=")? + "time=".len();
    let digits: String = output[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

/// Numeric address from the `PING host (1.2.3.4) ...` header line
pub fn parse_resolved_ip(output: &str) -> Option<String> {
    let header = output.lines().find(|l| l.starts_with("PING "))?;
    let open = header.find('(')? + 1;
    let close = open + header[open..].find(')')?;
    let ip = header[open..close].trim();
    (!ip.is_empty()).then(|| ip.to_string())
}

#[async_trait]
impl Probe for PingProbe {
    async fn probe(&self, address: &HostAddress) -> Result<ProbeResult, ProbeError> {
        let limit = self.wait + PROCESS_GRACE;
        let output = match run_command(&self.ping_path, self.args(address), limit).await {
            Ok(output) => output,
            // The process outlived its own reply wait: nobody answered
            Err(CommandError::Timeout { .. }) => {
                debug!(address = %address, "Ping process timed out");
                return Ok(ProbeResult::unreachable());
            }
            Err(e @ CommandError::SpawnFailed { .. }) => {
                return Err(ProbeError::Unavailable(e.to_string()))
            }
            Err(CommandError::Io(msg)) => return Err(ProbeError::Io(msg)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            debug!(
                address = %address,
                exit_code = ?output.status.code(),
                stderr = %stderr_text(&output),
                "No echo reply"
            );
            return Ok(ProbeResult::unreachable());
        }

        let mut result = ProbeResult::reachable(parse_latency(&stdout));
        if let Some(ip) = parse_resolved_ip(&stdout) {
            result = result.with_resolved_ip(ip);
        }
        debug!(address = %address, latency_ms = ?result.latency_ms, "Echo reply received");
        Ok(result)
    }
}
