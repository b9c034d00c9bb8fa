// Application Layer - Monitoring loops and their scheduling

pub mod constants;
pub mod dispatch;
pub mod monitor;
pub mod page_checker;
mod panic_guard;
pub mod policy;
pub mod scheduler;

// Re-exports
pub use dispatch::{DispatchReport, Dispatcher};
pub use monitor::{CycleObservation, Monitor};
pub use page_checker::{PageChecker, PageCheckerSettings, PageTarget, PageVerdict};
pub use panic_guard::{execute_guarded_async, PanicGuardResult};
pub use policy::{
    AlertPolicy, AlertState, Hysteresis, LatencyPolicy, LatencyState, RemediationPolicy,
    RemediationState, TransitionPolicy,
};
pub use scheduler::{
    shutdown_channel, Cycle, CycleOutcome, CycleReport, RepeatingTask, ShutdownSender,
    ShutdownToken,
};
