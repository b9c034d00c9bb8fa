//! Composition root: builds every enabled monitor from settings
//!
//! Clients are created once and injected into the core as `Arc<dyn Port>`.

use crate::config::Settings;
use anyhow::{Context, Result};
use homewatch_core::application::{
    AlertPolicy, Cycle, Dispatcher, Hysteresis, LatencyPolicy, Monitor, PageChecker,
    PageCheckerSettings, PageTarget, RemediationPolicy, RepeatingTask, ShutdownSender,
};
use homewatch_core::port::time_provider::SystemTimeProvider;
use homewatch_core::port::{Notifier, Probe};
use homewatch_infra_http::{
    build_client, HttpMetricsSink, HttpPlugRemediator, TwilioCredentials, TwilioNotifier,
    DEFAULT_HTTP_TIMEOUT,
};
use homewatch_infra_system::{ChromiumCapturer, DirectoryStore, PingProbe, TesseractDetector};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// How long `ping` waits for its echo reply
const PING_REPLY_WAIT: Duration = Duration::from_secs(5);

/// Every enabled monitor, ready to be spawned
pub struct Monitors {
    ip_checker: Option<RepeatingTask<Monitor<AlertPolicy>>>,
    plug_toggler: Option<RepeatingTask<Monitor<RemediationPolicy>>>,
    ping_checker: Option<RepeatingTask<Monitor<LatencyPolicy>>>,
    page_checker: Option<RepeatingTask<PageChecker>>,
}

impl Monitors {
    /// Build from validated settings
    pub fn build(settings: &Settings) -> Result<Self> {
        let http = build_client(DEFAULT_HTTP_TIMEOUT).context("HTTP client")?;
        let probe: Arc<dyn Probe> = Arc::new(PingProbe::new(&settings.ping_path, PING_REPLY_WAIT));

        // Required by validation whenever a notifying monitor is enabled
        let dispatcher = settings.twilio.as_ref().map(|t| {
            let notifier: Arc<dyn Notifier> = Arc::new(TwilioNotifier::new(
                http.clone(),
                TwilioCredentials {
                    account_sid: t.account_sid.clone(),
                    auth_token: t.auth_token.clone(),
                    number: t.number.clone(),
                },
            ));
            Dispatcher::new(notifier, settings.recipients())
        });
        let require_dispatcher = || {
            dispatcher
                .clone()
                .context("[twilio] section missing for a notifying monitor")
        };

        let ip_checker = match &settings.ip_checker {
            Some(cfg) => {
                let hysteresis = Hysteresis {
                    offline_threshold: cfg.offline_threshold,
                    interval: cfg.interval(),
                    ..Hysteresis::default()
                };
                let policy =
                    AlertPolicy::new(require_dispatcher()?, Arc::new(SystemTimeProvider), hysteresis);
                let monitor = Monitor::new("ip-checker", cfg.registry()?, probe.clone(), policy)
                    .with_probe_timeout(cfg.probe_timeout());
                Some(RepeatingTask::new(monitor, cfg.interval()))
            }
            None => None,
        };

        let plug_toggler = match &settings.plug_toggler {
            Some(cfg) => {
                let hysteresis = Hysteresis {
                    offline_threshold: cfg.offline_threshold,
                    recovery_threshold: cfg.recovery_threshold,
                    interval: cfg.interval(),
                };
                let remediator = Arc::new(HttpPlugRemediator::new(
                    http.clone(),
                    &cfg.plugs_endpoint,
                ));
                let policy = RemediationPolicy::new(remediator, hysteresis)
                    .with_power_cycle_pause(cfg.power_cycle_pause());
                let monitor = Monitor::new("plug-toggler", cfg.registry()?, probe.clone(), policy)
                    .with_probe_timeout(cfg.probe_timeout());
                Some(RepeatingTask::new(monitor, cfg.interval()))
            }
            None => None,
        };

        let ping_checker = match &settings.ping_checker {
            Some(cfg) => {
                let sink = Arc::new(HttpMetricsSink::new(http.clone(), &cfg.metrics_endpoint));
                let policy = LatencyPolicy::new(sink, &cfg.namespace);
                let monitor = Monitor::new("ping-checker", cfg.registry()?, probe.clone(), policy)
                    .with_probe_timeout(cfg.probe_timeout());
                Some(RepeatingTask::new(monitor, cfg.interval()))
            }
            None => None,
        };

        let page_checker = match &settings.page_checker {
            Some(cfg) => {
                let mut page_settings = PageCheckerSettings::new(cfg.screenshot_dir());
                for marker in &cfg.markers {
                    page_settings =
                        page_settings.with_markers(&marker.retailer, marker.texts.clone());
                }
                let pages = cfg
                    .pages
                    .iter()
                    .map(|p| PageTarget::new(&p.name, &p.url))
                    .collect();
                let checker = PageChecker::new(
                    pages,
                    Arc::new(ChromiumCapturer::new(&cfg.chromium_path)),
                    Arc::new(TesseractDetector::new(&cfg.tesseract_path)),
                    Arc::new(DirectoryStore::new(cfg.publish_dir(), &cfg.public_base_url)),
                    require_dispatcher()?,
                    page_settings,
                );
                Some(RepeatingTask::new(checker, cfg.interval()))
            }
            None => None,
        };

        Ok(Self {
            ip_checker,
            plug_toggler,
            ping_checker,
            page_checker,
        })
    }

    /// Spawn one tokio task per monitor, each with its own shutdown token
    pub fn spawn(self, shutdown: &ShutdownSender) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if let Some(task) = self.ip_checker {
            handles.push(spawn_task(task, shutdown));
        }
        if let Some(task) = self.plug_toggler {
            handles.push(spawn_task(task, shutdown));
        }
        if let Some(task) = self.ping_checker {
            handles.push(spawn_task(task, shutdown));
        }
        if let Some(task) = self.page_checker {
            handles.push(spawn_task(task, shutdown));
        }
        handles
    }
}

fn spawn_task<C: Cycle + 'static>(task: RepeatingTask<C>, shutdown: &ShutdownSender) -> JoinHandle<()> {
    let token = shutdown.token();
    info!(
        task = %task.cycle().name(),
        interval_secs = task.interval().as_secs(),
        "Spawning monitor"
    );
    tokio::spawn(async move { task.run(token).await })
}
