//! Push notification delivery.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PipelineError;

/// Payload rendered for one alert, sent identically to every endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub device_name: String,
    pub device_id: String,
    pub colour: String,
    pub battery_level: f64,
    pub charging: bool,
    /// True when the recipient is not the device owner.
    pub shared: bool,
    pub formatted_value: String,
    pub title: String,
    pub body: String,
}

/// Delivery result for a single endpoint, reported in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    Failed(String),
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver the payload to each endpoint. The returned vec holds one
    /// outcome per endpoint, in the same order as the input slice.
    async fn send(
        &self,
        endpoints: &[String],
        payload: &PushPayload,
    ) -> Result<Vec<PushOutcome>, PipelineError>;
}

// ---------------------------------------------------------------------------
// HTTP gateway
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GatewayRequest<'a> {
    endpoints: &'a [String],
    #[serde(flatten)]
    payload: &'a PushPayload,
}

#[derive(serde::Deserialize)]
struct GatewayResponse {
    results: Vec<GatewayResult>,
}

#[derive(serde::Deserialize)]
struct GatewayResult {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Gateway that POSTs the payload to an HTTP relay service.
pub struct HttpPushGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpPushGateway {
    pub fn new(url: String) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| PipelineError::Push(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(
        &self,
        endpoints: &[String],
        payload: &PushPayload,
    ) -> Result<Vec<PushOutcome>, PipelineError> {
        let request = GatewayRequest { endpoints, payload };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Push(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Push(format!(
                "gateway returned {status}"
            )));
        }

        let body: GatewayResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Push(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| {
                if r.ok {
                    PushOutcome::Delivered
                } else {
                    PushOutcome::Failed(r.error.unwrap_or_else(|| "unknown".to_string()))
                }
            })
            .collect())
    }
}
