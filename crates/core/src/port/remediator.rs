// Remediator Port (controllable power device)
use crate::domain::DeviceHandle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Binary power state of a smart plug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn from_on(on: bool) -> Self {
        if on {
            PowerState::On
        } else {
            PowerState::Off
        }
    }

    pub fn is_on(self) -> bool {
        self == PowerState::On
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Off => write!(f, "off"),
        }
    }
}

/// Remediation errors
#[derive(Error, Debug, Clone)]
pub enum RemediationError {
    #[error("Device rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid device response: {0}")]
    InvalidResponse(String),
}

/// Query and command the power state of a device tied to a target
///
/// The device is external: its state may drift from what the monitor
/// last commanded, so callers query before acting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Remediator: Send + Sync {
    async fn get_state(&self, handle: &DeviceHandle) -> Result<PowerState, RemediationError>;

    async fn set_state(
        &self,
        handle: &DeviceHandle,
        state: PowerState,
    ) -> Result<(), RemediationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory smart plug bank (plugs start ON)
    pub struct FakePlug {
        states: Mutex<HashMap<String, PowerState>>,
        commands: Mutex<Vec<(String, PowerState)>>,
        fail_queries: AtomicBool,
        fail_commands: AtomicBool,
    }

    impl FakePlug {
        pub fn new() -> Self {
            Self {
                states: Mutex::new(HashMap::new()),
                commands: Mutex::new(Vec::new()),
                fail_queries: AtomicBool::new(false),
                fail_commands: AtomicBool::new(false),
            }
        }

        /// Force the reported state, as if someone flipped the plug by hand
        pub fn force_state(&self, handle: &str, state: PowerState) {
            self.states.lock().unwrap().insert(handle.to_string(), state);
        }

        pub fn state(&self, handle: &str) -> PowerState {
            self.states
                .lock()
                .unwrap()
                .get(handle)
                .copied()
                .unwrap_or(PowerState::On)
        }

        /// Commands received, in order (including failed ones)
        pub fn commands(&self) -> Vec<(String, PowerState)> {
            self.commands.lock().unwrap().clone()
        }

        pub fn set_fail_queries(&self, fail: bool) {
            self.fail_queries.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_commands(&self, fail: bool) {
            self.fail_commands.store(fail, Ordering::SeqCst);
        }
    }

    impl Default for FakePlug {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Remediator for FakePlug {
        async fn get_state(&self, handle: &DeviceHandle) -> Result<PowerState, RemediationError> {
            if self.fail_queries.load(Ordering::SeqCst) {
                return Err(RemediationError::Transport("mock query failure".to_string()));
            }
            Ok(self.state(handle.as_str()))
        }

        async fn set_state(
            &self,
            handle: &DeviceHandle,
            state: PowerState,
        ) -> Result<(), RemediationError> {
            self.commands
                .lock()
                .unwrap()
                .push((handle.as_str().to_string(), state));

            if self.fail_commands.load(Ordering::SeqCst) {
                return Err(RemediationError::Transport("mock command failure".to_string()));
            }
            self.force_state(handle.as_str(), state);
            Ok(())
        }
    }
}
