//! Detection providers: turn a decoded camera frame into labelled, confidence-scored detections.
//!
//! Every provider implements [`Detector`]; callers pick one through [`build_detector`] and never
//! branch on the concrete type.

mod detector;
mod error;
mod frame;
mod remote;
mod single_best;

pub use detector::{build_detector, Detection, Detector, DetectorKind, DetectorSettings};
pub use error::DetectError;
pub use frame::{decode_frame, encode_png};
pub use image::RgbImage;
pub use remote::RemoteDetector;
pub use single_best::{best_detection, SingleBestDetector, DEFAULT_MIN_CONFIDENCE};
