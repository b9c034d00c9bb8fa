//! Daemon configuration
//!
//! TOML file (`HOMEWATCH_CONFIG`, default `~/.homewatch/homewatch.toml`)
//! overlaid by `HOMEWATCH__SECTION__KEY` environment variables.
//! A monitor runs when its section is present.

use homewatch_core::application::constants::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_METRICS_NAMESPACE, DEFAULT_OFFLINE_THRESHOLD,
    DEFAULT_PAGE_CHECK_INTERVAL, DEFAULT_PING_INTERVAL, DEFAULT_POWER_CYCLE_PAUSE,
    DEFAULT_PROBE_TIMEOUT, DEFAULT_RECOVERY_THRESHOLD,
};
use homewatch_core::domain::{DeviceHandle, HostAddress, Recipient, Target, TargetRegistry};
use homewatch_core::{AppError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "HOMEWATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "~/.homewatch/homewatch.toml";
const ENV_PREFIX: &str = "HOMEWATCH";
const ENV_SEPARATOR: &str = "__";

/// Config file location (tilde expanded)
pub fn config_path() -> PathBuf {
    let raw = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    expand(&raw)
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_ping_path")]
    pub ping_path: String,
    pub twilio: Option<TwilioSettings>,
    #[serde(default)]
    pub contacts: Vec<ContactSettings>,
    pub ip_checker: Option<IpCheckerSettings>,
    pub plug_toggler: Option<PlugTogglerSettings>,
    pub ping_checker: Option<PingCheckerSettings>,
    pub page_checker: Option<PageCheckerSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactSettings {
    pub name: String,
    pub number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    pub name: String,
    pub address: String,
    pub online_message: Option<String>,
    pub offline_message: Option<String>,
}

/// Alert-only monitor
#[derive(Debug, Clone, Deserialize)]
pub struct IpCheckerSettings {
    #[serde(default = "default_check_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: u32,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default)]
    pub devices: Vec<DeviceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlugTargetSettings {
    /// Defaults to the address
    pub name: Option<String>,
    pub address: String,
    pub plug: String,
}

/// Remediation monitor
#[derive(Debug, Clone, Deserialize)]
pub struct PlugTogglerSettings {
    pub plugs_endpoint: String,
    #[serde(default = "default_check_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: u32,
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: u32,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_power_cycle_pause_secs")]
    pub power_cycle_pause_secs: u64,
    #[serde(default)]
    pub targets: Vec<PlugTargetSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PingAddressSettings {
    pub name: String,
    pub address: String,
}

/// Latency metrics monitor
#[derive(Debug, Clone, Deserialize)]
pub struct PingCheckerSettings {
    pub metrics_endpoint: String,
    #[serde(default = "default_ping_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub addresses: Vec<PingAddressSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSettings {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerSettings {
    pub retailer: String,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageCheckerSettings {
    #[serde(default = "default_page_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_chromium_path")]
    pub chromium_path: String,
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: String,
    pub publish_dir: String,
    pub public_base_url: String,
    #[serde(default)]
    pub pages: Vec<PageSettings>,
    /// Added to (or replacing) the built-in retailer markers
    #[serde(default)]
    pub markers: Vec<MarkerSettings>,
}

fn default_port() -> u16 {
    8080
}
fn default_ping_path() -> String {
    "ping".to_string()
}
fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL.as_secs()
}
fn default_offline_threshold() -> u32 {
    DEFAULT_OFFLINE_THRESHOLD
}
fn default_recovery_threshold() -> u32 {
    DEFAULT_RECOVERY_THRESHOLD
}
fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_secs()
}
fn default_power_cycle_pause_secs() -> u64 {
    DEFAULT_POWER_CYCLE_PAUSE.as_secs()
}
fn default_ping_interval_secs() -> u64 {
    DEFAULT_PING_INTERVAL.as_secs()
}
fn default_page_interval_secs() -> u64 {
    DEFAULT_PAGE_CHECK_INTERVAL.as_secs()
}
fn default_namespace() -> String {
    DEFAULT_METRICS_NAMESPACE.to_string()
}
fn default_chromium_path() -> String {
    "chromium".to_string()
}
fn default_tesseract_path() -> String {
    "tesseract".to_string()
}
fn default_screenshot_dir() -> String {
    "~/.homewatch/screenshots".to_string()
}

impl Settings {
    /// Load file + environment overlay
    ///
    /// # Errors
    /// Returns `AppError::Config` if the file is missing or malformed
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    ///
    /// Env values stay strings until deserialization, so phone numbers keep
    /// their `+` and tokens keep leading zeros.
    pub fn load_with_env(path: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        config::Config::builder()
            .add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .source(env),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Startup checks beyond what deserialization enforces
    pub fn validate(&self) -> Result<()> {
        let notifying = self.ip_checker.is_some() || self.page_checker.is_some();
        if notifying {
            match &self.twilio {
                None => {
                    return Err(AppError::Config(
                        "[twilio] is required when ip_checker or page_checker is enabled".into(),
                    ))
                }
                Some(t) => {
                    non_empty("twilio.account_sid", &t.account_sid)?;
                    non_empty("twilio.auth_token", &t.auth_token)?;
                    non_empty("twilio.number", &t.number)?;
                }
            }
        }
        for contact in &self.contacts {
            non_empty("contacts.name", &contact.name)?;
            non_empty(&format!("contacts.{}.number", contact.name), &contact.number)?;
        }
        unique("contacts", self.contacts.iter().map(|c| c.name.as_str()))?;

        if let Some(ip) = &self.ip_checker {
            positive("ip_checker.interval_secs", ip.interval_secs)?;
            positive("ip_checker.probe_timeout_secs", ip.probe_timeout_secs)?;
            at_least_one("ip_checker.offline_threshold", ip.offline_threshold)?;
            ip.registry()?;
        }
        if let Some(plug) = &self.plug_toggler {
            http_url("plug_toggler.plugs_endpoint", &plug.plugs_endpoint)?;
            positive("plug_toggler.interval_secs", plug.interval_secs)?;
            positive("plug_toggler.probe_timeout_secs", plug.probe_timeout_secs)?;
            at_least_one("plug_toggler.offline_threshold", plug.offline_threshold)?;
            at_least_one("plug_toggler.recovery_threshold", plug.recovery_threshold)?;
            for target in &plug.targets {
                non_empty("plug_toggler.targets.plug", &target.plug)?;
            }
            plug.registry()?;
        }
        if let Some(ping) = &self.ping_checker {
            http_url("ping_checker.metrics_endpoint", &ping.metrics_endpoint)?;
            positive("ping_checker.interval_secs", ping.interval_secs)?;
            positive("ping_checker.probe_timeout_secs", ping.probe_timeout_secs)?;
            non_empty("ping_checker.namespace", &ping.namespace)?;
            ping.registry()?;
        }
        if let Some(page) = &self.page_checker {
            positive("page_checker.interval_secs", page.interval_secs)?;
            http_url("page_checker.public_base_url", &page.public_base_url)?;
            non_empty("page_checker.publish_dir", &page.publish_dir)?;
            for p in &page.pages {
                non_empty("page_checker.pages.name", &p.name)?;
                http_url(&format!("page_checker.pages.{}.url", p.name), &p.url)?;
            }
            unique("page_checker.pages", page.pages.iter().map(|p| p.name.as_str()))?;
        }
        Ok(())
    }

    pub fn recipients(&self) -> Vec<Recipient> {
        self.contacts
            .iter()
            .map(|c| Recipient::new(&c.name, &c.number))
            .collect()
    }

    /// Names of enabled monitors
    pub fn enabled_monitors(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.ip_checker.is_some() {
            enabled.push("ip-checker");
        }
        if self.plug_toggler.is_some() {
            enabled.push("plug-toggler");
        }
        if self.ping_checker.is_some() {
            enabled.push("ping-checker");
        }
        if self.page_checker.is_some() {
            enabled.push("page-checker");
        }
        enabled
    }
}

impl IpCheckerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn registry(&self) -> Result<TargetRegistry> {
        let targets = self
            .devices
            .iter()
            .map(|d| {
                Ok(Target::new(&d.name, HostAddress::parse(&d.address)?)
                    .with_messages(d.online_message.clone(), d.offline_message.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TargetRegistry::new(targets)?)
    }
}

impl PlugTogglerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn power_cycle_pause(&self) -> Duration {
        Duration::from_secs(self.power_cycle_pause_secs)
    }

    pub fn registry(&self) -> Result<TargetRegistry> {
        let targets = self
            .targets
            .iter()
            .map(|t| {
                let name = t.name.clone().unwrap_or_else(|| t.address.clone());
                Ok(Target::new(name, HostAddress::parse(&t.address)?)
                    .with_remediation(DeviceHandle::new(&t.plug)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TargetRegistry::new(targets)?)
    }
}

impl PingCheckerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn registry(&self) -> Result<TargetRegistry> {
        let targets = self
            .addresses
            .iter()
            .map(|a| Ok(Target::new(&a.name, HostAddress::parse(&a.address)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(TargetRegistry::new(targets)?)
    }
}

impl PageCheckerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        expand(&self.screenshot_dir)
    }

    pub fn publish_dir(&self) -> PathBuf {
        expand(&self.publish_dir)
    }
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(AppError::Validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

fn at_least_one(field: &str, value: u32) -> Result<()> {
    if value < 1 {
        return Err(AppError::Validation(format!("{field} must be at least 1")));
    }
    Ok(())
}

fn http_url(field: &str, value: &str) -> Result<()> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(AppError::Validation(format!(
            "{field} must be an http(s) URL, got '{value}'"
        )));
    }
    Ok(())
}

fn unique<'a>(field: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(AppError::Validation(format!("duplicate name in {field}: {name}")));
        }
    }
    Ok(())
}
