//! Scheduler - Runs a cycle repeatedly at a fixed interval
//!
//! - One cycle at a time: a trigger while a cycle is running is skipped, not queued
//! - The interval is measured from the end of a cycle to the start of the next
//! - Stops on shutdown (the in-flight cycle always runs to completion)

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Summary of one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items (targets, pages) fully evaluated
    pub evaluated: usize,
    /// Items skipped because of an error
    pub skipped: usize,
}

/// A unit of periodic work
///
/// Call through [`RepeatingTask`], which guarantees cycles never overlap.
#[async_trait]
pub trait Cycle: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn run_cycle(&self) -> CycleReport;
}

/// Result of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// A previous cycle was still running; nothing was done
    Skipped,
}

/// Clears the running flag when dropped (also on panic)
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Repeating task with an idle/running flag
pub struct RepeatingTask<C> {
    cycle: C,
    interval: Duration,
    running: AtomicBool,
    completed: AtomicU64,
}

impl<C: Cycle> RepeatingTask<C> {
    /// Create a new repeating task
    ///
    /// # Arguments
    /// * `cycle` - The work to repeat
    /// * `interval` - Idle time between the end of one cycle and the next trigger
    pub fn new(cycle: C, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            running: AtomicBool::new(false),
            completed: AtomicU64::new(0),
        }
    }

    pub fn cycle(&self) -> &C {
        &self.cycle
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of cycles that ran to completion
    pub fn completed_cycles(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Run one cycle unless one is already in progress
    pub async fn trigger(&self) -> CycleOutcome {
        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            info!(
                task = %self.cycle.name(),
                "Cycle still running, will not restart"
            );
            return CycleOutcome::Skipped;
        };

        let started = Instant::now();
        let report = self.cycle.run_cycle().await;
        self.completed.fetch_add(1, Ordering::AcqRel);

        debug!(
            task = %self.cycle.name(),
            evaluated = report.evaluated,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle completed"
        );
        CycleOutcome::Completed(report)
    }

    /// Trigger, sleep `interval`, repeat until shutdown
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            task = %self.cycle.name(),
            interval_secs = self.interval.as_secs(),
            "Repeating task started"
        );

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            self.trigger().await;

            tokio::select! {
                _ = sleep(self.interval) => {},
                _ = shutdown.wait() => {
                    info!(task = %self.cycle.name(), "Repeating task interrupted while idle");
                    break;
                }
            }
        }

        info!(task = %self.cycle.name(), "Repeating task stopped");
    }
}
