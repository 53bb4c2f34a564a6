use std::sync::Arc;

use faunaguard_core::{
    AlertDispatcher, AlertEngine, CameraRegistry, DecisionPolicy, LatestAlert, Settings,
    SubscriberRegistry,
};
use faunaguard_detect::Detector;

/// Process-wide state handed to every handler. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub cameras: Arc<CameraRegistry>,
    pub subscribers: Arc<SubscriberRegistry>,
    pub latest: Arc<LatestAlert>,
    pub engine: Arc<AlertEngine>,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        detector: Arc<dyn Detector>,
        dispatcher: Arc<dyn AlertDispatcher>,
    ) -> Self {
        let cameras = Arc::new(CameraRegistry::new(settings.camera_secret.clone()));
        let subscribers = Arc::new(SubscriberRegistry::new(dispatcher));
        let latest = Arc::new(LatestAlert::new());

        let engine = Arc::new(AlertEngine::new(
            detector,
            DecisionPolicy::from_settings(settings),
            cameras.clone(),
            subscribers.clone(),
            latest.clone(),
        ));

        Self {
            cameras,
            subscribers,
            latest,
            engine,
        }
    }
}
