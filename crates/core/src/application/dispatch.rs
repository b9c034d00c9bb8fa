// Notification fan-out to every recipient
use crate::domain::Recipient;
use crate::port::Notifier;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// Delivery counts of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends one message to all configured recipients concurrently
///
/// A failed delivery is logged and never affects the other recipients.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    recipients: Arc<[Recipient]>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, recipients: Vec<Recipient>) -> Self {
        Self {
            notifier,
            recipients: recipients.into(),
        }
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub async fn broadcast(&self, message: &str, attachment_url: Option<&str>) -> DispatchReport {
        let sends = self.recipients.iter().map(|recipient| async move {
            info!(recipient = %recipient.name, "Sending notification");
            let result = self.notifier.send(recipient, message, attachment_url).await;
            (recipient, result)
        });

        let mut report = DispatchReport::default();
        for (recipient, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        recipient = %recipient.name,
                        error = %e,
                        "Failed to deliver notification"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::notifier::mocks::RecordingNotifier;

    fn recipients() -> Vec<Recipient> {
        vec![
            Recipient::new("alice", "+15550000001"),
            Recipient::new("bob", "+15550000002"),
            Recipient::new("carol", "+15550000003"),
        ]
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Dispatcher::new(notifier.clone(), recipients());

        let report = dispatcher.broadcast("router down", None).await;

        assert_eq!(report, DispatchReport { delivered: 3, failed: 0 });
        assert_eq!(notifier.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_one_failing_recipient_does_not_block_others() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.fail_for("+15550000002");
        let dispatcher = Dispatcher::new(notifier.clone(), recipients());

        let report = dispatcher
            .broadcast("router down", Some("https://img.test/a.png"))
            .await;

        assert_eq!(report, DispatchReport { delivered: 2, failed: 1 });
        assert!(notifier.sent_to("+15550000002").is_empty());
        let to_carol = notifier.sent_to("+15550000003");
        assert_eq!(to_carol.len(), 1);
        assert_eq!(
            to_carol[0].attachment_url.as_deref(),
            Some("https://img.test/a.png")
        );
    }

    #[tokio::test]
    async fn test_no_recipients_is_a_noop() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Dispatcher::new(notifier.clone(), Vec::new());

        let report = dispatcher.broadcast("anything", None).await;

        assert_eq!(report, DispatchReport::default());
        assert_eq!(notifier.sent_count(), 0);
    }
}
