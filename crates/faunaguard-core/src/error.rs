// crates/faunaguard-core/src/error.rs

use thiserror::Error;

/// Rejections raised by the camera and subscriber registries. The display strings are the
/// messages returned to HTTP clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid secret")]
    Unauthorized,

    #[error("Camera id missing")]
    MissingCameraId,

    #[error("Device token missing")]
    MissingDeviceToken,
}
