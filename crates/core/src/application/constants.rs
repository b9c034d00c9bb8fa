// Monitoring constants (No magic values)
use std::time::Duration;

/// Interval between reachability cycles (30s)
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Offline cycles tolerated before acting (4 cycles = 2 minutes at 30s)
pub const DEFAULT_OFFLINE_THRESHOLD: u32 = 4;

/// Recovery cycles tolerated after a power-cycle (10 cycles = 5 minutes at 30s)
pub const DEFAULT_RECOVERY_THRESHOLD: u32 = 10;

/// Upper bound for a single probe; expiry counts as unreachable
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between the OFF and ON commands of a power-cycle
pub const DEFAULT_POWER_CYCLE_PAUSE: Duration = Duration::from_secs(5);

/// Interval between latency metric pushes (5 minutes)
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(300);

/// Interval between page checks (30 minutes)
pub const DEFAULT_PAGE_CHECK_INTERVAL: Duration = Duration::from_secs(1800);

/// Namespace of pushed latency metrics
pub const DEFAULT_METRICS_NAMESPACE: &str = "home-monitor-ping";

/// Viewport used for page screenshots
pub const SCREENSHOT_WIDTH: u32 = 1280;
pub const SCREENSHOT_HEIGHT: u32 = 1000;

/// Object key prefix for published page screenshots
pub const SCREENSHOT_KEY_PREFIX: &str = "page-checker-pictures";

pub(crate) const MILLIS_PER_MINUTE: f64 = 60_000.0;
