// MetricsSink adapter: JSON batch push
// Body mirrors a PutMetricData request: {Namespace, MetricData: [...]}
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::client::failure_details;
use homewatch_core::port::{LatencyDatum, MetricsError, MetricsSink};

const METRIC_NAME: &str = "Response Time";
const METRIC_UNIT: &str = "Milliseconds";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutMetricData<'a> {
    namespace: &'a str,
    metric_data: Vec<MetricDatum<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MetricDatum<'a> {
    metric_name: &'static str,
    unit: &'static str,
    value: f64,
    dimensions: Vec<Dimension<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Dimension<'a> {
    name: &'static str,
    value: &'a str,
}

impl<'a> From<&'a LatencyDatum> for MetricDatum<'a> {
    fn from(datum: &'a LatencyDatum) -> Self {
        let mut dimensions = vec![Dimension {
            name: "Hostname",
            value: &datum.hostname,
        }];
        if let Some(ip) = &datum.ip {
            dimensions.push(Dimension {
                name: "IP",
                value: ip,
            });
        }
        Self {
            metric_name: METRIC_NAME,
            unit: METRIC_UNIT,
            value: datum.latency_ms,
            dimensions,
        }
    }
}

pub struct HttpMetricsSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMetricsSink {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn push(&self, namespace: &str, datums: &[LatencyDatum]) -> Result<(), MetricsError> {
        let body = PutMetricData {
            namespace,
            metric_data: datums.iter().map(MetricDatum::from).collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(MetricsError::Rejected { status, message });
        }

        info!(namespace = %namespace, datums = datums.len(), "Metrics batch accepted");
        Ok(())
    }
}
