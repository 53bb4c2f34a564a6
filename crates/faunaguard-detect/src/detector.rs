use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DetectError;
use crate::remote::RemoteDetector;
use crate::single_best::{SingleBestDetector, DEFAULT_MIN_CONFIDENCE};

/// One labelled, confidence-scored finding for a single frame.
///
/// Serialized as a `[label, confidence]` pair, the shape cameras already consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "(String, f64)", from = "(String, f64)")]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl From<Detection> for (String, f64) {
    fn from(detection: Detection) -> Self {
        (detection.label, detection.confidence)
    }
}

impl From<(String, f64)> for Detection {
    fn from((label, confidence): (String, f64)) -> Self {
        Self { label, confidence }
    }
}

#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs inference on one frame. Detections come back in provider order, which is not
    /// necessarily sorted by confidence.
    async fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, DetectError>;
}

#[async_trait]
impl<D: Detector + ?Sized> Detector for Arc<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        (**self).detect(frame).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    /// Every box the model reports above its own threshold.
    #[default]
    MultiBox,
    /// Only the highest-scoring box, subject to a confidence floor.
    SingleBest,
}

impl FromStr for DetectorKind {
    type Err = DetectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "multi" | "multi-box" | "multi_box" => Ok(Self::MultiBox),
            "single" | "single-best" | "single_best" => Ok(Self::SingleBest),
            other => Err(DetectError::Configuration(format!(
                "unknown detector kind `{other}` (expected `multi` or `single-best`)"
            ))),
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultiBox => write!(f, "multi"),
            Self::SingleBest => write!(f, "single-best"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub kind: DetectorKind,
    pub url: String,
    pub timeout: Duration,
    pub single_best_min_confidence: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            kind: DetectorKind::MultiBox,
            url: "http://127.0.0.1:8500".to_string(),
            timeout: RemoteDetector::DEFAULT_TIMEOUT,
            single_best_min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

pub fn build_detector(settings: &DetectorSettings) -> Result<Arc<dyn Detector>, DetectError> {
    let remote = RemoteDetector::with_timeout(settings.url.clone(), settings.timeout)?;

    let detector: Arc<dyn Detector> = match settings.kind {
        DetectorKind::MultiBox => Arc::new(remote),
        DetectorKind::SingleBest => Arc::new(SingleBestDetector::with_min_confidence(
            remote,
            settings.single_best_min_confidence,
        )),
    };

    info!(
        detector = detector.name(),
        url = %settings.url,
        timeout_secs = settings.timeout.as_secs_f64(),
        "detection provider ready"
    );
    Ok(detector)
}
