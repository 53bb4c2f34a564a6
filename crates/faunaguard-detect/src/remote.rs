use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::detector::{Detection, Detector};
use crate::error::DetectError;
use crate::frame::encode_png;

/// Multi-box provider backed by an external inference service.
///
/// Frames are posted as PNG to `{base_url}/v1/detect`; every box the service returns is
/// passed through unfiltered and in the order received.
#[derive(Debug, Clone)]
pub struct RemoteDetector {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<RemoteBox>,
}

#[derive(Debug, Deserialize)]
struct RemoteBox {
    label: String,
    #[serde(alias = "conf", alias = "score")]
    confidence: f64,
}

impl RemoteDetector {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>) -> Result<Self, DetectError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DetectError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(DetectError::Configuration(
                "inference service url cannot be empty".into(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(%url, error = %err, "inference service unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl Detector for RemoteDetector {
    fn name(&self) -> &'static str {
        "remote-multi-box"
    }

    async fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        let url = format!("{}/v1/detect", self.base_url);
        let png = encode_png(frame)?;

        let form = Form::new().part(
            "image",
            Part::bytes(png)
                .file_name("frame.png")
                .mime_str("image/png")?,
        );

        let resp = self.client.post(&url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, %status, "inference service rejected frame");
            return Err(DetectError::Backend(format!(
                "inference service returned {status}: {body}"
            )));
        }

        let parsed: DetectResponse = resp.json().await?;
        debug!(count = parsed.detections.len(), "remote detections received");

        Ok(parsed
            .detections
            .into_iter()
            .map(|item| Detection::new(item.label, item.confidence))
            .collect())
    }
}
