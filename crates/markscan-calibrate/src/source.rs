//! Image decoding for editor sources.
//!
//! Both editors refuse input until a source has been decoded and its
//! natural dimensions are known, so decoding is the gate between an
//! upload and an interactive session.

use crate::types::{CalibrateError, RgbaImage};

/// Decode raw image bytes into an RGBA raster.
///
/// Supports PNG, JPEG, BMP, and WebP (whatever the `image` crate is
/// built with).
///
/// # Errors
///
/// Returns [`CalibrateError::EmptyInput`] if `bytes` is empty.
/// Returns [`CalibrateError::ImageDecode`] if the format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, CalibrateError> {
    if bytes.is_empty() {
        return Err(CalibrateError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    let rgba = img.to_rgba8();
    tracing::debug!(
        width = rgba.width(),
        height = rgba.height(),
        "decoded source image"
    );
    Ok(rgba)
}
