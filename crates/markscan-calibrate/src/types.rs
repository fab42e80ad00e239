//! Shared types for the markscan calibration core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can hold decoded sources
/// and crop results without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image-natural pixel space.
///
/// Coordinates are never display/CSS pixels; see
/// [`CanvasLayout`](crate::mapper::CanvasLayout) for the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Clamp into `[0, width] x [0, height]`. NaN maps to 0.
    #[must_use]
    pub fn clamp_to(self, dimensions: Dimensions) -> Self {
        let clamp = |v: f64, max: u32| {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, f64::from(max))
            }
        };
        Self {
            x: clamp(self.x, dimensions.width),
            y: clamp(self.y, dimensions.height),
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of a decoded image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle in image-natural pixel space.
///
/// `width` and `height` may be negative while a drag is in progress;
/// [`Rect::normalized`] flips them into a non-negative form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (or drag anchor x).
    pub x: f64,
    /// Top edge (or drag anchor y).
    pub y: f64,
    /// Horizontal extent; negative when dragged leftwards.
    pub width: f64,
    /// Vertical extent; negative when dragged upwards.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Flip negative extents so the rectangle has its top-left at
    /// `(x, y)` and non-negative width/height.
    #[must_use]
    pub fn normalized(self) -> Self {
        let x = if self.width < 0.0 {
            self.x + self.width
        } else {
            self.x
        };
        let y = if self.height < 0.0 {
            self.y + self.height
        } else {
            self.y
        };
        Self {
            x,
            y,
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }
}

/// Axis-aligned bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest x coordinate.
    pub min_x: f64,
    /// Smallest y coordinate.
    pub min_y: f64,
    /// Largest x coordinate.
    pub max_x: f64,
    /// Largest y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Bounding box of the given points, or `None` if `points` is empty.
    #[must_use]
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points[1..].iter().fold(init, |acc, p| Self {
            min_x: acc.min_x.min(p.x),
            min_y: acc.min_y.min(p.y),
            max_x: acc.max_x.max(p.x),
            max_y: acc.max_y.max(p.y),
        }))
    }

    /// `max_x - min_x`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// `max_y - min_y`.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whole-pixel size of a raster covering this box.
    ///
    /// Fractional extents are truncated, the same way a canvas
    /// truncates a fractional `width`/`height` assignment.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self) -> Dimensions {
        Dimensions {
            width: self.width().max(0.0) as u32,
            height: self.height().max(0.0) as u32,
        }
    }
}

/// Errors that can occur in the calibration editors and their helpers.
#[derive(Debug, thiserror::Error)]
pub enum CalibrateError {
    /// The image data could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input byte slice was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation needs a decoded image and none is loaded.
    #[error("no image loaded")]
    NoImage,

    /// A second multiple-choice region was drawn.
    #[error(
        "MCQ region already marked! You can only mark ONE MCQ region for all multiple choice questions."
    )]
    DuplicateMcq,

    /// Save was requested with an empty region list.
    #[error("Please mark at least one region")]
    NoRegions,

    /// Save was requested before the multiple-choice region exists.
    #[error("Please mark the MCQ region first")]
    MissingMcq,

    /// A region payload records zero image dimensions and cannot be
    /// rescaled.
    #[error("region payload has zero image dimensions")]
    ZeroDimensions,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clamp_to_keeps_points_inside() {
        let dims = Dimensions::new(100, 50);
        assert_eq!(Point::new(-5.0, 70.0).clamp_to(dims), Point::new(0.0, 50.0));
        assert_eq!(Point::new(120.0, -1.0).clamp_to(dims), Point::new(100.0, 0.0));
        assert_eq!(Point::new(10.0, 10.0).clamp_to(dims), Point::new(10.0, 10.0));
        assert_eq!(Point::new(f64::NAN, f64::INFINITY).clamp_to(dims), Point::new(0.0, 50.0));
    }

    #[test]
    fn normalized_flips_negative_extents() {
        let r = Rect::new(300.0, 150.0, -200.0, -50.0).normalized();
        assert_eq!(r, Rect::new(100.0, 100.0, 200.0, 50.0));
    }

    #[test]
    fn normalized_leaves_positive_extents() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.normalized(), r);
    }

    #[test]
    fn bounding_box_of_empty_is_none() {
        assert!(BoundingBox::of(&[]).is_none());
    }

    #[test]
    fn bounding_box_covers_all_points() {
        let bb = BoundingBox::of(&[
            Point::new(5.0, 9.0),
            Point::new(-2.0, 4.0),
            Point::new(7.5, 1.0),
        ])
        .unwrap();
        assert!((bb.min_x - -2.0).abs() < f64::EPSILON);
        assert!((bb.max_x - 7.5).abs() < f64::EPSILON);
        assert!((bb.min_y - 1.0).abs() < f64::EPSILON);
        assert!((bb.max_y - 9.0).abs() < f64::EPSILON);
        assert_eq!(bb.pixel_size(), Dimensions::new(9, 8));
    }

    #[test]
    fn error_messages_match_user_prompts() {
        assert_eq!(
            CalibrateError::NoRegions.to_string(),
            "Please mark at least one region"
        );
        assert_eq!(
            CalibrateError::MissingMcq.to_string(),
            "Please mark the MCQ region first"
        );
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(1000, 800).to_string(), "1000x800");
    }
}
