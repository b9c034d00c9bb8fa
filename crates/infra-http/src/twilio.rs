// Notifier adapter: Twilio Programmable Messaging REST API
use async_trait::async_trait;
use tracing::info;

use crate::client::failure_details;
use homewatch_core::domain::Recipient;
use homewatch_core::port::{Notifier, NotifyError};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// Sending phone number
    pub number: String,
}

/// Sends SMS/MMS through `POST /Accounts/{sid}/Messages.json`
pub struct TwilioNotifier {
    client: reqwest::Client,
    api_base: String,
    credentials: TwilioCredentials,
}

impl TwilioNotifier {
    pub fn new(client: reqwest::Client, credentials: TwilioCredentials) -> Self {
        Self {
            client,
            api_base: TWILIO_API_BASE.to_string(),
            credentials,
        }
    }

    /// Point at another API root (tests, regional edge)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.credentials.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(
        &self,
        recipient: &Recipient,
        message: &str,
        attachment_url: Option<&str>,
    ) -> Result<(), NotifyError> {
        if recipient.destination.trim().is_empty() {
            return Err(NotifyError::InvalidRecipient(recipient.name.clone()));
        }

        let mut form = vec![
            ("To", recipient.destination.as_str()),
            ("From", self.credentials.number.as_str()),
            ("Body", message),
        ];
        if let Some(url) = attachment_url {
            form.push(("MediaUrl", url));
        }

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(NotifyError::Rejected { status, message });
        }

        info!(recipient = %recipient.name, "SMS accepted by Twilio");
        Ok(())
    }
}
