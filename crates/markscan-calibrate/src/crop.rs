//! Bounding-box crop through a polygon clip.
//!
//! The output is the axis-aligned bounding box of the polygon. Pixels
//! inside the box but outside the polygon stay transparent. There is no
//! perspective correction: a rotated document stays rotated.

use tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::raster;
use crate::types::{BoundingBox, Point, RgbaImage};

/// Crop `source` to the bounding box of `polygon`, clipped to the
/// polygon itself.
///
/// The output raster measures `(max_x - min_x) x (max_y - min_y)`,
/// truncated to whole pixels, for any vertex order including
/// self-intersecting ones. Source pixel `(min_x, min_y)` maps to output
/// `(0, 0)`.
#[must_use = "returns the cropped image"]
#[allow(clippy::cast_possible_truncation)]
pub fn crop_to_polygon(source: &RgbaImage, polygon: &[Point]) -> RgbaImage {
    let Some(bbox) = BoundingBox::of(polygon) else {
        return RgbaImage::new(0, 0);
    };
    let size = bbox.pixel_size();
    let blank = || RgbaImage::new(size.width, size.height);

    let (Some(src), Some(mut out)) = (
        raster::to_pixmap(source),
        Pixmap::new(size.width, size.height),
    ) else {
        return blank();
    };

    let shifted: Vec<Point> = polygon
        .iter()
        .map(|p| Point::new(p.x - bbox.min_x, p.y - bbox.min_y))
        .collect();
    let Some(mask) = raster::polygon_mask(&shifted, size) else {
        return blank();
    };

    out.draw_pixmap(
        0,
        0,
        src.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate(-bbox.min_x as f32, -bbox.min_y as f32),
        Some(&mask),
    );

    tracing::debug!(
        width = size.width,
        height = size.height,
        min_x = bbox.min_x,
        min_y = bbox.min_y,
        "cropped source to polygon bounding box"
    );
    raster::to_rgba_image(out)
}
