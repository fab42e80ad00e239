//! tiny-skia backend for [`DrawCommand`] lists, plus the pixmap
//! conversions shared with [`crate::crop`].
//!
//! The browser executes the same command lists on a 2D canvas; this
//! backend exists for headless previews and for asserting rendered
//! output in tests. It has no font rasterizer, so
//! [`DrawCommand::Text`] is not drawn.

use tiny_skia::{
    BlendMode, ColorU8, FillRule, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash, Transform,
};

use crate::render::{DrawCommand, Rgba};
use crate::types::{Dimensions, Point, Rect, RgbaImage};

/// Convert a straight-alpha RGBA image into a premultiplied pixmap.
///
/// Returns `None` for zero-area images (tiny-skia rejects them).
#[must_use]
pub fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let c = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let size = tiny_skia::IntSize::from_wh(image.width(), image.height())?;
    Pixmap::from_vec(data, size)
}

/// Convert a premultiplied pixmap back into a straight-alpha image.
#[must_use]
pub fn to_rgba_image(pixmap: Pixmap) -> RgbaImage {
    let (w, h) = (pixmap.width(), pixmap.height());
    RgbaImage::from_raw(w, h, pixmap.take_demultiplied()).unwrap_or_else(|| RgbaImage::new(w, h))
}

/// Build a closed path through `polygon` in traversal order.
///
/// Returns `None` for fewer than two points or a path with no extent.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn polygon_path(polygon: &[Point]) -> Option<Path> {
    let (first, rest) = polygon.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

/// Coverage mask of a polygon on a surface of the given size.
///
/// Uses the non-zero rule, matching the canvas `clip()` default, so a
/// self-intersecting quadrilateral covers both of its lobes. A
/// degenerate polygon yields an empty mask.
#[must_use]
pub fn polygon_mask(polygon: &[Point], size: Dimensions) -> Option<Mask> {
    let mut mask = Mask::new(size.width, size.height)?;
    if let Some(path) = polygon_path(polygon) {
        mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    }
    Some(mask)
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

#[allow(clippy::cast_possible_truncation)]
fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    let r = rect.normalized();
    tiny_skia::Rect::from_xywh(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
}

/// Execute `commands` on a surface the size of `source`.
///
/// Returns an empty image if `source` has zero area.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rasterize(commands: &[DrawCommand], source: &RgbaImage) -> RgbaImage {
    let size = Dimensions::of(source);
    let (Some(src), Some(mut canvas)) = (to_pixmap(source), Pixmap::new(size.width, size.height))
    else {
        return RgbaImage::new(size.width, size.height);
    };

    for cmd in commands {
        match cmd {
            DrawCommand::Clear => canvas.fill(tiny_skia::Color::TRANSPARENT),
            DrawCommand::Image => canvas.draw_pixmap(
                0,
                0,
                src.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            ),
            DrawCommand::ClippedImage { polygon } => {
                if let Some(mask) = polygon_mask(polygon, size) {
                    canvas.draw_pixmap(
                        0,
                        0,
                        src.as_ref(),
                        &PixmapPaint::default(),
                        Transform::identity(),
                        Some(&mask),
                    );
                }
            }
            DrawCommand::FillRect { rect, color } => {
                if let Some(r) = skia_rect(*rect) {
                    canvas.fill_rect(r, &paint(*color), Transform::identity(), None);
                }
            }
            DrawCommand::ErasePolygon { polygon } => {
                if let Some(path) = polygon_path(polygon) {
                    let mut eraser = paint(Rgba::opaque(0, 0, 0));
                    eraser.blend_mode = BlendMode::DestinationOut;
                    canvas.fill_path(
                        &path,
                        &eraser,
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            DrawCommand::StrokePolygon {
                polygon,
                color,
                width,
            } => {
                if let Some(path) = polygon_path(polygon) {
                    let stroke = Stroke {
                        width: *width as f32,
                        ..Stroke::default()
                    };
                    canvas.stroke_path(&path, &paint(*color), &stroke, Transform::identity(), None);
                }
            }
            DrawCommand::StrokeRect {
                rect,
                color,
                width,
                dash,
            } => {
                if let Some(r) = skia_rect(*rect) {
                    let path = PathBuilder::from_rect(r);
                    let stroke = Stroke {
                        width: *width as f32,
                        dash: dash.and_then(|[on, off]| {
                            StrokeDash::new(vec![on as f32, off as f32], 0.0)
                        }),
                        ..Stroke::default()
                    };
                    canvas.stroke_path(&path, &paint(*color), &stroke, Transform::identity(), None);
                }
            }
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => {
                if let Some(path) =
                    PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32)
                {
                    canvas.fill_path(
                        &path,
                        &paint(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            // No font rasterizer in this backend.
            DrawCommand::Text { .. } => {}
        }
    }

    to_rgba_image(canvas)
}
