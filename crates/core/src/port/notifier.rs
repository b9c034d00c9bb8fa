// Notifier Port (text alerts)
use crate::domain::Recipient;
use async_trait::async_trait;
use thiserror::Error;

/// Notification delivery errors
#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    #[error("Provider rejected message (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Sends a text alert to a single recipient
///
/// Failures are non-fatal for callers: the monitor logs and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `recipient`, optionally with a media attachment URL
    async fn send(
        &self,
        recipient: &Recipient,
        message: &str,
        attachment_url: Option<&str>,
    ) -> Result<(), NotifyError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// A message captured by the recording notifier
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub destination: String,
        pub message: String,
        pub attachment_url: Option<String>,
    }

    /// Mock notifier that records deliveries and fails for chosen destinations
    pub struct RecordingNotifier {
        sent: Mutex<Vec<SentMessage>>,
        failing: Mutex<HashSet<String>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing: Mutex::new(HashSet::new()),
            }
        }

        /// Every send to `destination` fails with a provider rejection
        pub fn fail_for(&self, destination: &str) {
            self.failing.lock().unwrap().insert(destination.to_string());
        }

        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn sent_to(&self, destination: &str) -> Vec<SentMessage> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.destination == destination)
                .cloned()
                .collect()
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl Default for RecordingNotifier {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(
            &self,
            recipient: &Recipient,
            message: &str,
            attachment_url: Option<&str>,
        ) -> Result<(), NotifyError> {
            if self.failing.lock().unwrap().contains(&recipient.destination) {
                return Err(NotifyError::Rejected {
                    status: 400,
                    message: format!("mock rejection for {}", recipient.destination),
                });
            }

            self.sent.lock().unwrap().push(SentMessage {
                destination: recipient.destination.clone(),
                message: message.to_string(),
                attachment_url: attachment_url.map(str::to_string),
            });
            Ok(())
        }
    }
}
