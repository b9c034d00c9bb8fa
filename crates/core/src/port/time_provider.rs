// Time Provider Port (for testability)

use chrono::{Local, TimeZone};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Local wall-clock timestamp used as the prefix of alert messages
    fn timestamp(&self) -> String {
        format_timestamp(self.now_millis())
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Format epoch millis as `YYYY-MM-DD HH:MM:SS +HH:MM` in local time
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        None => millis.to_string(),
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Manually advanced clock
    pub struct MockTimeProvider {
        current: AtomicI64,
    }

    impl MockTimeProvider {
        pub fn new(current_millis: i64) -> Self {
            Self {
                current: AtomicI64::new(current_millis),
            }
        }

        pub fn advance(&self, millis: i64) {
            self.current.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl TimeProvider for MockTimeProvider {
        fn now_millis(&self) -> i64 {
            self.current.load(Ordering::SeqCst)
        }
    }
}
