#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use faunaguard_core::{
    Alert, AlertDispatcher, AlertEngine, CameraRegistry, DangerousSet, DecisionPolicy,
    DispatchError, LatestAlert, Subscriber, SubscriberRegistry,
};
use faunaguard_detect::{encode_png, DetectError, Detection, Detector, RgbImage};

pub const SECRET: &str = "test-secret";

pub struct FixedDetector(pub Vec<Detection>);

#[async_trait]
impl Detector for FixedDetector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn detect(&self, _frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        Ok(self.0.clone())
    }
}

pub struct FailingDetector;

#[async_trait]
impl Detector for FailingDetector {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn detect(&self, _frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        Err(DetectError::Backend("model runtime unavailable".into()))
    }
}

pub struct SlowDetector;

#[async_trait]
impl Detector for SlowDetector {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn detect(&self, _frame: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Mutex<Vec<(Alert, Vec<Subscriber>)>>,
}

impl RecordingDispatcher {
    pub fn calls(&self) -> Vec<(Alert, Vec<Subscriber>)> {
        self.calls.lock().expect("dispatcher lock").clone()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, alert: &Alert, subscribers: &[Subscriber]) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .expect("dispatcher lock")
            .push((alert.clone(), subscribers.to_vec()));
        Ok(())
    }
}

pub struct UnreachableDispatcher;

#[async_trait]
impl AlertDispatcher for UnreachableDispatcher {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn notify(&self, _alert: &Alert, _subscribers: &[Subscriber]) -> Result<(), DispatchError> {
        Err(DispatchError::Delivery {
            channel: "push",
            message: "gateway unreachable".into(),
        })
    }
}

pub struct Harness {
    pub engine: AlertEngine,
    pub cameras: Arc<CameraRegistry>,
    pub subscribers: Arc<SubscriberRegistry>,
    pub latest: Arc<LatestAlert>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

pub fn policy() -> DecisionPolicy {
    DecisionPolicy {
        dangerous: DangerousSet::from_labels(["lion", "tiger", "bear", "wolf"]),
        min_confidence: None,
        detect_timeout: Duration::from_secs(2),
    }
}

pub fn harness(detector: impl Detector + 'static, policy: DecisionPolicy) -> Harness {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let cameras = Arc::new(CameraRegistry::new(SECRET));
    let subscribers = Arc::new(SubscriberRegistry::new(dispatcher.clone()));
    let latest = Arc::new(LatestAlert::new());
    let engine = AlertEngine::new(
        Arc::new(detector),
        policy,
        cameras.clone(),
        subscribers.clone(),
        latest.clone(),
    );
    Harness {
        engine,
        cameras,
        subscribers,
        latest,
        dispatcher,
    }
}

pub fn frame_base64() -> String {
    let png = encode_png(&RgbImage::new(4, 4)).expect("encode png");
    STANDARD.encode(png)
}
