use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("inference transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference backend error: {0}")]
    Backend(String),

    #[error("detection timed out after {0:?}")]
    Timeout(Duration),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}
