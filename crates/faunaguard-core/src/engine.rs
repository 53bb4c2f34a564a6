use std::sync::Arc;
use std::time::Duration;

use faunaguard_detect::{decode_frame, DetectError, Detection, Detector};
use tokio::task;
use tracing::{debug, error, info};

use crate::alert::{first_dangerous, Alert, DangerousSet, LatestAlert};
use crate::cameras::CameraRegistry;
use crate::config::Settings;
use crate::subscribers::SubscriberRegistry;

#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    pub dangerous: DangerousSet,
    pub min_confidence: Option<f64>,
    pub detect_timeout: Duration,
}

impl DecisionPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dangerous: settings.dangerous_animals.clone(),
            min_confidence: settings.min_confidence(),
            detect_timeout: settings.detector.timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Dangerous { animal: String, confidence: f64 },
    Clear { animals_detected: Vec<Detection> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Decided(Verdict),
    /// The frame could not be decoded or the detector failed.
    Fault { message: String },
}

pub struct AlertEngine {
    detector: Arc<dyn Detector>,
    policy: DecisionPolicy,
    cameras: Arc<CameraRegistry>,
    subscribers: Arc<SubscriberRegistry>,
    latest: Arc<LatestAlert>,
}

impl AlertEngine {
    pub fn new(
        detector: Arc<dyn Detector>,
        policy: DecisionPolicy,
        cameras: Arc<CameraRegistry>,
        subscribers: Arc<SubscriberRegistry>,
        latest: Arc<LatestAlert>,
    ) -> Self {
        Self {
            detector,
            policy,
            cameras,
            subscribers,
            latest,
        }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Decodes a base64 frame, runs the detector and decides. Never fails: decode errors,
    /// detector errors and timeouts all come back as [`FrameOutcome::Fault`].
    pub async fn process_frame(&self, camera_id: &str, image_base64: String) -> FrameOutcome {
        match self.detect(image_base64).await {
            Ok(detections) => FrameOutcome::Decided(self.decide(camera_id, detections).await),
            Err(err) => {
                error!(camera_id, error = %err, "detection error");
                FrameOutcome::Fault {
                    message: err.to_string(),
                }
            }
        }
    }

    async fn detect(&self, image_base64: String) -> Result<Vec<Detection>, DetectError> {
        let frame = task::spawn_blocking(move || decode_frame(&image_base64))
            .await
            .map_err(|err| DetectError::Internal(format!("frame decode task failed: {err}")))??;

        let timeout = self.policy.detect_timeout;
        match tokio::time::timeout(timeout, self.detector.detect(&frame)).await {
            Ok(result) => result,
            Err(_) => Err(DetectError::Timeout(timeout)),
        }
    }

    /// Scans `detections` in order and acts on the first dangerous label.
    ///
    /// On a match the latest alert is replaced and subscribers are notified once. Otherwise only
    /// the detected flag of the latest alert is dropped.
    pub async fn decide(&self, camera_id: &str, detections: Vec<Detection>) -> Verdict {
        let hit = first_dangerous(&detections, &self.policy.dangerous, self.policy.min_confidence);

        let Some(hit) = hit else {
            self.latest.clear().await;
            debug!(camera_id, count = detections.len(), "no dangerous animal in frame");
            return Verdict::Clear {
                animals_detected: detections,
            };
        };

        let location = self.cameras.lookup(camera_id).await;
        let alert = Alert::dangerous(hit.label.clone(), location, hit.confidence);
        self.latest.record(alert.clone()).await;

        info!(
            camera_id,
            animal = %hit.label,
            confidence = hit.confidence,
            location = alert.location.as_deref().unwrap_or_default(),
            "dangerous animal detected"
        );

        self.subscribers.dispatch(&alert).await;

        Verdict::Dangerous {
            animal: hit.label.clone(),
            confidence: hit.confidence,
        }
    }
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEngine")
            .field("detector", &self.detector.name())
            .field("policy", &self.policy)
            .finish()
    }
}
