use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbImage};

use crate::error::DetectError;

/// Decodes a base64 camera upload into an 8-bit RGB frame.
///
/// The container format is sniffed from the bytes. Whitespace anywhere in the payload is
/// skipped, so MIME-wrapped uploads decode the same as single-line ones.
pub fn decode_frame(encoded: &str) -> Result<RgbImage, DetectError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(image.to_rgb8())
}

pub fn encode_png(frame: &RgbImage) -> Result<Vec<u8>, DetectError> {
    let mut buffer = Cursor::new(Vec::new());
    frame.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
