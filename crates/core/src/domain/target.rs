// Monitored Target Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Network address of a monitored device (IP literal or DNS hostname)
///
/// Validated on construction so a malformed address fails at startup
/// instead of inside a polling cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostAddress(String);

impl HostAddress {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(invalid(&raw, "address is empty"));
        }
        if trimmed.parse::<IpAddr>().is_ok() {
            return Ok(Self(trimmed.to_string()));
        }

        validate_hostname(trimmed).map_err(|reason| invalid(&raw, reason))?;
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the address is an IP literal (no DNS resolution needed)
    pub fn is_ip(&self) -> bool {
        self.0.parse::<IpAddr>().is_ok()
    }
}

fn invalid(address: &str, reason: &str) -> DomainError {
    DomainError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_hostname(host: &str) -> std::result::Result<(), &'static str> {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.len() > MAX_HOSTNAME_LEN {
        return Err("hostname longer than 253 characters");
    }

    let labels: Vec<&str> = host.split('.').collect();
    for label in &labels {
        if label.is_empty() {
            return Err("hostname contains an empty label");
        }
        if label.len() > MAX_LABEL_LEN {
            return Err("hostname label longer than 63 characters");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("hostname may only contain letters, digits, '-' and '.'");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("hostname label may not start or end with '-'");
        }
    }

    // "300.1.1.1" is a broken IPv4 literal, not a hostname
    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err("malformed IP address");
    }
    Ok(())
}

impl TryFrom<String> for HostAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<HostAddress> for String {
    fn from(address: HostAddress) -> Self {
        address.0
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of a controllable power device (smart plug address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceHandle(String);

impl DeviceHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monitored network endpoint. Immutable after configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub address: HostAddress,
    pub online_message: Option<String>,
    pub offline_message: Option<String>,
    pub remediation: Option<DeviceHandle>,
}

impl Target {
    pub fn new(name: impl Into<String>, address: HostAddress) -> Self {
        Self {
            name: name.into(),
            address,
            online_message: None,
            offline_message: None,
            remediation: None,
        }
    }

    pub fn with_messages(mut self, online: Option<String>, offline: Option<String>) -> Self {
        self.online_message = online;
        self.offline_message = offline;
        self
    }

    pub fn with_remediation(mut self, handle: DeviceHandle) -> Self {
        self.remediation = Some(handle);
        self
    }
}

/// Set of targets owned by one monitor, keyed by unique name
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new(targets: Vec<Target>) -> Result<Self> {
        let mut seen = HashSet::new();
        for target in &targets {
            if target.name.trim().is_empty() {
                return Err(DomainError::EmptyName);
            }
            if !seen.insert(target.name.as_str()) {
                return Err(DomainError::DuplicateTarget(target.name.clone()));
            }
        }
        Ok(Self { targets })
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
