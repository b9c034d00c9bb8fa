// Remediator adapter: smart plug REST bridge
// GET|PUT <endpoint>/<plug>/state, body {"on": bool}
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::failure_details;
use homewatch_core::domain::DeviceHandle;
use homewatch_core::port::{PowerState, RemediationError, Remediator};

#[derive(Debug, Serialize, Deserialize)]
struct PlugState {
    on: bool,
}

/// GET responses wrap the state in `payload`
#[derive(Debug, Deserialize)]
struct PlugStateResponse {
    payload: PlugState,
}

pub struct HttpPlugRemediator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPlugRemediator {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn state_url(&self, handle: &DeviceHandle) -> String {
        format!("{}/{}/state", self.endpoint.trim_end_matches('/'), handle)
    }
}

fn transport(e: reqwest::Error) -> RemediationError {
    RemediationError::Transport(e.to_string())
}

#[async_trait]
impl Remediator for HttpPlugRemediator {
    async fn get_state(&self, handle: &DeviceHandle) -> Result<PowerState, RemediationError> {
        let response = self
            .client
            .get(self.state_url(handle))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(RemediationError::Rejected { status, message });
        }

        let body: PlugStateResponse = response
            .json()
            .await
            .map_err(|e| RemediationError::InvalidResponse(e.to_string()))?;
        Ok(PowerState::from_on(body.payload.on))
    }

    async fn set_state(
        &self,
        handle: &DeviceHandle,
        state: PowerState,
    ) -> Result<(), RemediationError> {
        let response = self
            .client
            .put(self.state_url(handle))
            .json(&PlugState { on: state.is_on() })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(RemediationError::Rejected { status, message });
        }

        info!(plug = %handle, state = %state, "Plug accepted new state");
        Ok(())
    }
}
