//! Backend-neutral draw commands.
//!
//! Each editor turns its current state into a fresh `Vec<DrawCommand>`
//! on every change. Backends (the browser canvas in `markscan-io`, the
//! tiny-skia rasterizer in [`crate::raster`]) execute the list from the
//! top; every list starts with [`DrawCommand::Clear`] so replaying it
//! never accumulates earlier frames.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Rect};

/// A straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with explicit alpha.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS `rgba()` string for the canvas 2D API.
    #[must_use]
    pub fn to_css(self) -> String {
        let alpha = f64::from(self.a) / 255.0;
        format!("rgba({}, {}, {}, {alpha:.3})", self.r, self.g, self.b)
    }
}

/// Horizontal text placement relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    /// Anchor is the left end of the alphabetic baseline.
    Baseline,
    /// Anchor is the center of the text box.
    Center,
}

/// One drawing operation.
///
/// Coordinates are image-natural pixels; backends size their surface to
/// the source image before executing.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Reset the whole surface to transparent.
    Clear,
    /// Draw the source image at `(0, 0)`.
    Image,
    /// Draw the source image at `(0, 0)` clipped to a closed polygon.
    ClippedImage {
        /// Polygon vertices in traversal order.
        polygon: Vec<Point>,
    },
    /// Fill an axis-aligned rectangle.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Rgba,
    },
    /// Make the inside of a closed polygon fully transparent
    /// (`destination-out` compositing).
    ErasePolygon {
        /// Polygon vertices in traversal order.
        polygon: Vec<Point>,
    },
    /// Stroke the outline of a closed polygon.
    StrokePolygon {
        /// Polygon vertices in traversal order.
        polygon: Vec<Point>,
        /// Stroke color.
        color: Rgba,
        /// Line width in pixels.
        width: f64,
    },
    /// Stroke a rectangle outline, optionally dashed.
    ///
    /// The rectangle may carry negative extents (an in-progress drag).
    StrokeRect {
        /// Rectangle to outline.
        rect: Rect,
        /// Stroke color.
        color: Rgba,
        /// Line width in pixels.
        width: f64,
        /// Dash pattern `[on, off]`, `None` for solid.
        dash: Option<[f64; 2]>,
    },
    /// Fill a disc.
    FillCircle {
        /// Disc center.
        center: Point,
        /// Disc radius.
        radius: f64,
        /// Fill color.
        color: Rgba,
    },
    /// Draw a text label.
    Text {
        /// Label content.
        text: String,
        /// Anchor point, interpreted per `align`.
        position: Point,
        /// Fill color.
        color: Rgba,
        /// Bold font size in pixels.
        size: f64,
        /// Anchor interpretation.
        align: TextAlign,
    },
}

/// Colors and sizes used by both editors' render functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    /// Dimming layer laid over the image outside the scan polygon.
    pub overlay: Rgba,
    /// Scan polygon outline and corner handle fill.
    pub accent: Rgba,
    /// Scan polygon outline width.
    pub outline_width: f64,
    /// Outer (white) handle radius.
    pub handle_outer_radius: f64,
    /// Inner (accent) handle radius.
    pub handle_inner_radius: f64,
    /// Handle ring and label color.
    pub handle_ring: Rgba,
    /// Corner label font size.
    pub handle_label_size: f64,
    /// Multiple-choice region color.
    pub mcq: Rgba,
    /// Written region color.
    pub written: Rgba,
    /// In-progress draft rectangle color.
    pub draft: Rgba,
    /// Region rectangle stroke width.
    pub region_stroke_width: f64,
    /// Draft dash pattern `[on, off]`.
    pub draft_dash: [f64; 2],
    /// Label tag width.
    pub tag_width: f64,
    /// Label tag height.
    pub tag_height: f64,
    /// Label font size.
    pub tag_label_size: f64,
    /// Label text color.
    pub tag_text: Rgba,
}

impl RenderStyle {
    /// `#3b82f6`.
    pub const BLUE: Rgba = Rgba::opaque(0x3b, 0x82, 0xf6);
    /// `#10b981`.
    pub const GREEN: Rgba = Rgba::opaque(0x10, 0xb9, 0x81);
    /// `#ef4444`.
    pub const RED: Rgba = Rgba::opaque(0xef, 0x44, 0x44);
    /// Opaque white.
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    /// Black at 30% opacity.
    pub const DIM: Rgba = Rgba::new(0, 0, 0, 77);
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            overlay: Self::DIM,
            accent: Self::BLUE,
            outline_width: 3.0,
            handle_outer_radius: 20.0,
            handle_inner_radius: 15.0,
            handle_ring: Self::WHITE,
            handle_label_size: 10.0,
            mcq: Self::BLUE,
            written: Self::GREEN,
            draft: Self::RED,
            region_stroke_width: 3.0,
            draft_dash: [5.0, 5.0],
            tag_width: 180.0,
            tag_height: 30.0,
            tag_label_size: 16.0,
            tag_text: Self::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_color_formats_alpha_as_fraction() {
        assert_eq!(RenderStyle::BLUE.to_css(), "rgba(59, 130, 246, 1.000)");
        assert_eq!(RenderStyle::DIM.to_css(), "rgba(0, 0, 0, 0.302)");
    }

    #[test]
    fn default_style_distinguishes_region_types() {
        let style = RenderStyle::default();
        assert_ne!(style.mcq, style.written);
        assert_ne!(style.draft, style.mcq);
        assert_ne!(style.draft, style.written);
    }
}
