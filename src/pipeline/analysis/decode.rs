//! Upload validation and image decoding.
//!
//! Validation only looks at sizes and never touches the decoder. Decoding
//! reads the header first to refuse decompression bombs, then decodes,
//! applies the EXIF orientation and converts to RGBA.

use std::io::Cursor;

use image::{DynamicImage, ImageError};
use tracing::debug;

use super::thresholds::MAX_PIXELS;
use super::types::PixelBuffer;
use super::AnalysisError;
use crate::pipeline::upload::ImageUpload;

/// Reject uploads larger than `max_bytes` before any decode is attempted.
pub fn validate_upload(upload: &ImageUpload, max_bytes: u64) -> Result<(), AnalysisError> {
    let size = upload.size();
    if size > max_bytes {
        return Err(AnalysisError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    if upload.bytes.is_empty() {
        return Err(AnalysisError::EmptyUpload);
    }
    Ok(())
}

/// Decode encoded image bytes into an upright RGBA pixel buffer.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyUpload);
    }

    let format = image::guess_format(bytes)
        .map_err(|e| AnalysisError::UnsupportedFormat(e.to_string()))?;

    let (width, height) = image::io::Reader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(map_image_error)?;
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(AnalysisError::TooManyPixels { width, height });
    }

    let decoded =
        image::load_from_memory_with_format(bytes, format).map_err(map_image_error)?;

    let orientation = read_exif_orientation(bytes);
    let upright = apply_orientation(decoded, orientation);
    let rgba = upright.to_rgba8();

    debug!(
        format = ?format,
        width = rgba.width(),
        height = rgba.height(),
        orientation,
        "Decoded leaf image"
    );

    Ok(PixelBuffer::new(rgba))
}

fn map_image_error(error: ImageError) -> AnalysisError {
    match error {
        ImageError::Unsupported(e) => AnalysisError::UnsupportedFormat(e.to_string()),
        other => AnalysisError::Decode(other),
    }
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Rotate/flip so the image is displayed the way the camera held it.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
