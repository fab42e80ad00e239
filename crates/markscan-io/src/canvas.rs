//! Draw-command executor for `CanvasRenderingContext2d`.
//!
//! The visible canvas is sized to the image's natural resolution and
//! scaled by CSS. `Image` and `ClippedImage` draw from a
//! [`SourceSurface`], an off-screen canvas holding the decoded pixels,
//! so clipping and `destination-out` compositing apply to it like any
//! other drawing.

use std::f64::consts::TAU;

use markscan_calibrate::{Dimensions, DrawCommand, Point, RgbaImage, TextAlign};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Errors that can occur while drawing to a canvas.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// The canvas did not hand out a 2D context.
    #[error("2D canvas context unavailable")]
    NoContext,
}

impl From<JsValue> for CanvasError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Off-screen canvas holding a decoded image.
#[derive(Debug)]
pub struct SourceSurface {
    canvas: HtmlCanvasElement,
    dimensions: Dimensions,
}

impl SourceSurface {
    /// Copy `image` into a new off-screen canvas.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError`] if the document, the context, or the
    /// `ImageData` cannot be created (e.g. a zero-area image).
    pub fn from_image(image: &RgbaImage) -> Result<Self, CanvasError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CanvasError::JsError("no document".into()))?;
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|e| CanvasError::JsError(format!("failed to cast element: {e:?}")))?;
        let dimensions = Dimensions::of(image);
        canvas.set_width(dimensions.width);
        canvas.set_height(dimensions.height);

        let data = web_sys::ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(image.as_raw()),
            dimensions.width,
            dimensions.height,
        )?;
        context_2d(&canvas)?.put_image_data(&data, 0.0, 0.0)?;
        Ok(Self { canvas, dimensions })
    }

    /// Natural size of the held image.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

/// The 2D context of `canvas`.
///
/// # Errors
///
/// Returns [`CanvasError::NoContext`] if the browser refuses one.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, CanvasError> {
    canvas
        .get_context("2d")?
        .ok_or(CanvasError::NoContext)?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| CanvasError::NoContext)
}

fn trace_polygon(ctx: &CanvasRenderingContext2d, polygon: &[Point]) {
    ctx.begin_path();
    let Some((first, rest)) = polygon.split_first() else {
        return;
    };
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: &[f64]) -> Result<(), CanvasError> {
    let segments: js_sys::Array = dash.iter().map(|v| JsValue::from_f64(*v)).collect();
    ctx.set_line_dash(&segments)?;
    Ok(())
}

/// Execute `commands` on `canvas`, drawing images from `source`.
///
/// Resizes the canvas to the source's natural size first.
///
/// # Errors
///
/// Returns [`CanvasError`] if the context is unavailable or a drawing
/// call throws.
pub fn draw(
    canvas: &HtmlCanvasElement,
    source: &SourceSurface,
    commands: &[DrawCommand],
) -> Result<(), CanvasError> {
    let Dimensions { width, height } = source.dimensions;
    if canvas.width() != width {
        canvas.set_width(width);
    }
    if canvas.height() != height {
        canvas.set_height(height);
    }
    let ctx = context_2d(canvas)?;
    ctx.set_global_composite_operation("source-over")?;

    for cmd in commands {
        match cmd {
            DrawCommand::Clear => {
                ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
            }
            DrawCommand::Image => {
                ctx.draw_image_with_html_canvas_element(&source.canvas, 0.0, 0.0)?;
            }
            DrawCommand::ClippedImage { polygon } => {
                ctx.save();
                trace_polygon(&ctx, polygon);
                ctx.clip();
                ctx.draw_image_with_html_canvas_element(&source.canvas, 0.0, 0.0)?;
                ctx.restore();
            }
            DrawCommand::FillRect { rect, color } => {
                ctx.set_fill_style_str(&color.to_css());
                ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            }
            DrawCommand::ErasePolygon { polygon } => {
                ctx.save();
                ctx.set_global_composite_operation("destination-out")?;
                ctx.set_fill_style_str("#000");
                trace_polygon(&ctx, polygon);
                ctx.fill();
                ctx.restore();
            }
            DrawCommand::StrokePolygon {
                polygon,
                color,
                width,
            } => {
                set_dash(&ctx, &[])?;
                ctx.set_stroke_style_str(&color.to_css());
                ctx.set_line_width(*width);
                trace_polygon(&ctx, polygon);
                ctx.stroke();
            }
            DrawCommand::StrokeRect {
                rect,
                color,
                width,
                dash,
            } => {
                set_dash(&ctx, dash.as_ref().map_or(&[][..], |d| &d[..]))?;
                ctx.set_stroke_style_str(&color.to_css());
                ctx.set_line_width(*width);
                ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
                set_dash(&ctx, &[])?;
            }
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => {
                ctx.set_fill_style_str(&color.to_css());
                ctx.begin_path();
                ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
                ctx.fill();
            }
            DrawCommand::Text {
                text,
                position,
                color,
                size,
                align,
            } => {
                ctx.set_fill_style_str(&color.to_css());
                ctx.set_font(&format!("bold {size}px sans-serif"));
                match align {
                    TextAlign::Center => {
                        ctx.set_text_align("center");
                        ctx.set_text_baseline("middle");
                    }
                    TextAlign::Baseline => {
                        ctx.set_text_align("start");
                        ctx.set_text_baseline("alphabetic");
                    }
                }
                ctx.fill_text(text, position.x, position.y)?;
            }
        }
    }
    Ok(())
}

/// Draw onto the canvas with `canvas_id` if it is mounted, logging
/// failures to the browser console.
pub fn redraw(canvas_id: &str, source: &SourceSurface, commands: &[DrawCommand]) {
    let Some(canvas) = crate::pointer::canvas_by_id(canvas_id) else {
        return;
    };
    if let Err(e) = draw(&canvas, source, commands) {
        tracing::warn!(canvas_id, error = %e, "canvas redraw failed");
        web_sys::console::warn_1(&JsValue::from(format!(
            "markscan: redraw of #{canvas_id} failed: {e}"
        )));
    }
}
