use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use super::multipart::MultipartForm;
use crate::pose::Keypoint;
use crate::sample::Sample;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Response of one HTTP exchange, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP seam. `Err` means no response was obtained at all.
pub trait Transport: Send + Sync + 'static {
    fn post_form(&self, endpoint: &str, form: &MultipartForm) -> Result<TransportResponse>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn post_form(&self, endpoint: &str, form: &MultipartForm) -> Result<TransportResponse> {
        let result = self
            .agent
            .post(endpoint)
            .set("Accept", "application/json")
            .set("Content-Type", &form.content_type())
            .send_bytes(&form.to_bytes());

        match result {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .context("failed to read training server response")?;
                Ok(TransportResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(TransportResponse {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(err) => Err(anyhow!("POST {endpoint} failed: {err}")),
        }
    }
}

/// JSON carried in the `data` form field.
#[derive(Debug, Serialize)]
pub struct TrainingPayload<'a> {
    pub name: &'a str,
    pub keypoints: &'a [Vec<Keypoint>],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    pub status: Option<u16>,
    /// Raw server reply, or the transport error text.
    pub response: String,
}

impl SubmissionResult {
    fn failed(response: String) -> Self {
        Self {
            success: false,
            status: None,
            response,
        }
    }

    pub fn describe(&self) -> String {
        match (self.success, self.status) {
            (true, Some(status)) => format!("sent (HTTP {status})"),
            (false, Some(status)) => format!("server rejected sample (HTTP {status})"),
            (_, None) => format!("send failed: {}", self.response),
        }
    }
}

pub fn build_form(sample: &Sample, label: &str, secret: &str) -> Result<MultipartForm> {
    let payload = TrainingPayload {
        name: label,
        keypoints: &sample.frames,
    };
    let data = serde_json::to_string(&payload).context("failed to serialize sample")?;
    Ok(MultipartForm::new().text("secret", secret).text("data", data))
}

/// Post one sample to the training server. Exactly one request, no retry;
/// the sample is not touched.
pub async fn submit(
    transport: Arc<dyn Transport>,
    sample: &Sample,
    label: &str,
    endpoint: &str,
    secret: &str,
) -> SubmissionResult {
    let form = match build_form(sample, label, secret) {
        Ok(form) => form,
        Err(err) => return SubmissionResult::failed(format!("{err:#}")),
    };

    let endpoint_owned = endpoint.to_string();
    let exchange = tokio::task::spawn_blocking(move || transport.post_form(&endpoint_owned, &form))
        .await
        .context("submission worker join failed");

    let result = match exchange {
        Ok(Ok(response)) => SubmissionResult {
            success: response.is_success(),
            status: Some(response.status),
            response: response.body,
        },
        Ok(Err(err)) | Err(err) => SubmissionResult::failed(format!("{err:#}")),
    };

    if result.success {
        log_info!("sample '{}' ({} frames) accepted by {}", label, sample.len(), endpoint);
    } else {
        log_warn!("sample '{}' not accepted by {}: {}", label, endpoint, result.describe());
    }

    result
}

/// Endpoint, secret and transport for one capture session.
#[derive(Clone)]
pub struct SubmissionClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    secret: String,
}

impl SubmissionClient {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            secret: secret.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn submit(&self, sample: &Sample) -> SubmissionResult {
        submit(
            Arc::clone(&self.transport),
            sample,
            &sample.label,
            &self.endpoint,
            &self.secret,
        )
        .await
    }
}
