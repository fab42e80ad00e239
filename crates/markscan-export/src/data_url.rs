//! `data:` URL encoding for cropped scans.
//!
//! Mirrors what a canvas `toDataURL` produces: JPEG has no alpha, so
//! transparent pixels come out black; PNG keeps them.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{Rgb, RgbImage};

use markscan_calibrate::RgbaImage;

use crate::ExportError;

/// Data URL of a zero-area canvas.
pub const EMPTY: &str = "data:,";

/// Raster format inside the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUrlFormat {
    /// Lossy, quality `1..=100`.
    Jpeg {
        /// Encoder quality; out-of-range values are clamped.
        quality: u8,
    },
    /// Lossless with transparency.
    Png,
}

impl DataUrlFormat {
    /// Quality used for scan uploads.
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// MIME type for the URL header.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl Default for DataUrlFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: Self::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, empty when the URL omits it.
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// Drop alpha by compositing over black, as a canvas JPEG export does.
#[must_use]
pub fn flatten_onto_black(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let scale = |c: u8| {
            let v = (u16::from(c) * u16::from(a) + 127) / 255;
            u8::try_from(v).unwrap_or(u8::MAX)
        };
        Rgb([scale(r), scale(g), scale(b)])
    })
}

/// Encode `image` as a base64 `data:` URL.
///
/// A zero-area image yields [`EMPTY`].
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode(image: &RgbaImage, format: DataUrlFormat) -> Result<String, ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Ok(EMPTY.to_owned());
    }
    let mut buf = Cursor::new(Vec::new());
    match format {
        DataUrlFormat::Jpeg { quality } => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            flatten_onto_black(image).write_with_encoder(encoder)?;
        }
        DataUrlFormat::Png => {
            image.write_with_encoder(PngEncoder::new(&mut buf))?;
        }
    }
    let bytes = buf.into_inner();
    Ok(format!(
        "data:{};base64,{}",
        format.mime(),
        STANDARD.encode(&bytes)
    ))
}

/// Split a `data:` URL into its media type and decoded bytes.
///
/// Non-base64 payloads are returned as their raw UTF-8 bytes.
///
/// # Errors
///
/// Returns [`ExportError::MalformedDataUrl`] if the scheme or comma is
/// missing, or [`ExportError::Base64`] for a corrupt payload.
pub fn decode(url: &str) -> Result<DataUrl, ExportError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(ExportError::MalformedDataUrl("missing data: scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or(ExportError::MalformedDataUrl("missing comma separator"))?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let bytes = if is_base64 {
        STANDARD.decode(payload.trim())?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok(DataUrl {
        mime: mime.to_owned(),
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn half_transparent() -> RgbaImage {
        RgbaImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([255, 255, 255, 0])
            }
        })
    }

    #[test]
    fn png_url_decodes_back_to_same_pixels() {
        let img = half_transparent();
        let url = encode(&img, DataUrlFormat::Png).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = decode(&url).unwrap();
        assert_eq!(decoded.mime, "image/png");
        let back = image::load_from_memory(&decoded.bytes).unwrap().to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn jpeg_flattens_transparency_to_black() {
        let url = encode(&half_transparent(), DataUrlFormat::default()).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let bytes = decode(&url).unwrap().bytes;
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (16, 8));
        assert!(back.get_pixel(1, 4).0[0] > 200);
        assert!(back.get_pixel(14, 4).0[0] < 50);
    }

    #[test]
    fn flatten_scales_by_alpha() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([200, 100, 50, 128]));
        assert_eq!(flatten_onto_black(&img).get_pixel(0, 0).0, [100, 50, 25]);
    }

    #[test]
    fn empty_image_gives_empty_url() {
        let url = encode(&RgbaImage::new(0, 10), DataUrlFormat::Png).unwrap();
        assert_eq!(url, EMPTY);
        let decoded = decode(&url).unwrap();
        assert!(decoded.mime.is_empty());
        assert!(decoded.bytes.is_empty());
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(matches!(
            decode("https://example.com/a.png"),
            Err(ExportError::MalformedDataUrl(_))
        ));
        assert!(matches!(
            decode("data:image/png;base64"),
            Err(ExportError::MalformedDataUrl(_))
        ));
        assert!(matches!(
            decode("data:image/png;base64,!!!"),
            Err(ExportError::Base64(_))
        ));
    }
}
