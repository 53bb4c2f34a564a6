use async_trait::async_trait;
use image::RgbImage;

use crate::detector::{Detection, Detector};
use crate::error::DetectError;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.55;

/// Reduces any provider to its single highest-scoring detection.
#[derive(Debug, Clone)]
pub struct SingleBestDetector<D> {
    inner: D,
    min_confidence: f64,
}

impl<D: Detector> SingleBestDetector<D> {
    pub fn new(inner: D) -> Self {
        Self::with_min_confidence(inner, DEFAULT_MIN_CONFIDENCE)
    }

    pub fn with_min_confidence(inner: D, min_confidence: f64) -> Self {
        Self {
            inner,
            min_confidence,
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }
}

/// Picks the highest-confidence detection, keeping the earliest one on ties.
/// Returns `None` when the winner scores below `min_confidence`.
pub fn best_detection(detections: Vec<Detection>, min_confidence: f64) -> Option<Detection> {
    let mut best: Option<Detection> = None;

    for detection in detections {
        if !detection.confidence.is_finite() {
            continue;
        }
        match &best {
            Some(current) if detection.confidence <= current.confidence => {}
            _ => best = Some(detection),
        }
    }

    best.filter(|detection| detection.confidence >= min_confidence)
}

#[async_trait]
impl<D: Detector> Detector for SingleBestDetector<D> {
    fn name(&self) -> &'static str {
        "single-best"
    }

    async fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        let detections = self.inner.detect(frame).await?;
        Ok(best_detection(detections, self.min_confidence)
            .into_iter()
            .collect())
    }
}
