use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::RegistryError;

/// Location reported for cameras that were never registered.
pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraRecord {
    pub camera_id: String,
    pub location: String,
}

/// In-memory camera id -> location map, written only through the admin secret.
#[derive(Debug)]
pub struct CameraRegistry {
    admin_secret: String,
    cameras: RwLock<HashMap<String, CameraRecord>>,
}

impl CameraRegistry {
    pub fn new(admin_secret: impl Into<String>) -> Self {
        Self {
            admin_secret: admin_secret.into(),
            cameras: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or overwrites a camera. The secret is checked before anything else, so an
    /// unauthenticated caller never learns whether its payload was otherwise valid.
    pub async fn register(
        &self,
        camera_id: &str,
        location: Option<&str>,
        secret: &str,
    ) -> Result<(), RegistryError> {
        if !secrets_match(&self.admin_secret, secret) {
            warn!(camera_id, "camera registration rejected: invalid secret");
            return Err(RegistryError::Unauthorized);
        }

        if camera_id.trim().is_empty() {
            return Err(RegistryError::MissingCameraId);
        }

        let record = CameraRecord {
            camera_id: camera_id.to_string(),
            location: location.unwrap_or(UNKNOWN_LOCATION).to_string(),
        };

        let previous = self
            .cameras
            .write()
            .await
            .insert(record.camera_id.clone(), record.clone());

        info!(
            camera_id = %record.camera_id,
            location = %record.location,
            overwritten = previous.is_some(),
            "camera registered"
        );
        Ok(())
    }

    /// Location of `camera_id`, or [`UNKNOWN_LOCATION`] when it is not registered. Ids are
    /// matched exactly as registered.
    pub async fn lookup(&self, camera_id: &str) -> String {
        self.cameras
            .read()
            .await
            .get(camera_id)
            .map(|record| record.location.clone())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }

    pub async fn get(&self, camera_id: &str) -> Option<CameraRecord> {
        self.cameras.read().await.get(camera_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.cameras.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cameras.read().await.is_empty()
    }
}

// Length still leaks; the byte comparison does not short-circuit.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let (expected, provided) = (expected.as_bytes(), provided.as_bytes());
    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
