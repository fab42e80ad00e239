//! Pointer-to-image coordinate mapping.
//!
//! A canvas is laid out at some CSS size while its backing store holds
//! the image at natural resolution. Pointer positions arrive in viewport
//! (client) coordinates and have to be rescaled into natural pixel space
//! before any hit-testing or drawing logic sees them.
//!
//! Mouse and touch input are normalized here into a single
//! [`PointerEvent`] so the editors have one code path.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// A position in browser viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientPoint {
    /// Viewport x (`clientX`).
    pub x: f64,
    /// Viewport y (`clientY`).
    pub y: f64,
}

impl ClientPoint {
    /// Create a new client point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Raw pointer input before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPointer {
    /// Mouse or pen event carrying its own client position.
    Mouse(ClientPoint),
    /// Touch event; coordinates live on the touch list.
    Touch(Vec<ClientPoint>),
}

impl RawPointer {
    /// The client position this input refers to.
    ///
    /// Touch input uses the first active touch. Returns `None` for a
    /// touch list with no entries (e.g. `touchend`).
    #[must_use]
    pub fn client_point(&self) -> Option<ClientPoint> {
        match self {
            Self::Mouse(p) => Some(*p),
            Self::Touch(touches) => touches.first().copied(),
        }
    }
}

/// Which part of a gesture an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    /// Button pressed / finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released / finger lifted.
    Up,
    /// Pointer left the canvas or the platform cancelled the gesture.
    Cancel,
}

/// Unified pointer event in image-natural pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Gesture started at the given point.
    Down(Point),
    /// Gesture moved to the given point.
    Move(Point),
    /// Gesture ended normally.
    Up,
    /// Gesture aborted without an explicit release.
    Cancel,
}

/// Geometry of a canvas element at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasLayout {
    /// Left edge of the bounding client rect.
    pub left: f64,
    /// Top edge of the bounding client rect.
    pub top: f64,
    /// Rendered (CSS) width.
    pub rendered_width: f64,
    /// Rendered (CSS) height.
    pub rendered_height: f64,
    /// Backing-store width, equal to the image's natural width.
    pub natural_width: f64,
    /// Backing-store height, equal to the image's natural height.
    pub natural_height: f64,
}

impl CanvasLayout {
    /// Whether the canvas has a non-zero rendered size.
    ///
    /// Scale factors are undefined until layout has happened.
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.rendered_width > 0.0
            && self.rendered_height > 0.0
            && self.rendered_width.is_finite()
            && self.rendered_height.is_finite()
    }

    /// Independent horizontal and vertical scale factors
    /// (`natural / rendered`).
    #[must_use]
    pub fn scale(&self) -> Option<(f64, f64)> {
        self.is_laid_out().then(|| {
            (
                self.natural_width / self.rendered_width,
                self.natural_height / self.rendered_height,
            )
        })
    }

    /// Map a client position into image-natural pixel space.
    ///
    /// Returns `None` when the canvas has not been laid out.
    #[must_use]
    pub fn to_image_space(&self, client: ClientPoint) -> Option<Point> {
        let (sx, sy) = self.scale()?;
        Some(Point::new(
            (client.x - self.left) * sx,
            (client.y - self.top) * sy,
        ))
    }
}

/// Map raw input into image-natural pixel space.
///
/// Returns `None` if the input has no position or the canvas has zero
/// rendered size.
#[must_use]
pub fn to_image_space(raw: &RawPointer, layout: &CanvasLayout) -> Option<Point> {
    layout.to_image_space(raw.client_point()?)
}

/// Normalize raw mouse/touch input into a [`PointerEvent`].
///
/// `Up` and `Cancel` carry no position, so they normalize even when the
/// touch list is empty. `Down` and `Move` require a mappable position.
#[must_use]
pub fn normalize(
    raw: &RawPointer,
    phase: PointerPhase,
    layout: &CanvasLayout,
) -> Option<PointerEvent> {
    match phase {
        PointerPhase::Up => Some(PointerEvent::Up),
        PointerPhase::Cancel => Some(PointerEvent::Cancel),
        PointerPhase::Down => to_image_space(raw, layout).map(PointerEvent::Down),
        PointerPhase::Move => to_image_space(raw, layout).map(PointerEvent::Move),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// 1000x800 image shown at half size, offset by (20, 40).
    const HALF_SIZE: CanvasLayout = CanvasLayout {
        left: 20.0,
        top: 40.0,
        rendered_width: 500.0,
        rendered_height: 400.0,
        natural_width: 1000.0,
        natural_height: 800.0,
    };

    #[test]
    fn scales_and_offsets_mouse_input() {
        let p = to_image_space(&RawPointer::Mouse(ClientPoint::new(70.0, 90.0)), &HALF_SIZE);
        assert_eq!(p, Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn horizontal_and_vertical_scale_are_independent() {
        let layout = CanvasLayout {
            rendered_width: 250.0,
            ..HALF_SIZE
        };
        let p = layout
            .to_image_space(ClientPoint::new(20.0 + 25.0, 40.0 + 25.0))
            .unwrap();
        assert!((p.x - 100.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn touch_uses_first_touch() {
        let raw = RawPointer::Touch(vec![
            ClientPoint::new(270.0, 440.0),
            ClientPoint::new(0.0, 0.0),
        ]);
        assert_eq!(to_image_space(&raw, &HALF_SIZE), Some(Point::new(500.0, 800.0)));
    }

    #[test]
    fn mouse_and_touch_normalize_identically() {
        let at = ClientPoint::new(120.0, 140.0);
        let mouse = normalize(&RawPointer::Mouse(at), PointerPhase::Move, &HALF_SIZE);
        let touch = normalize(&RawPointer::Touch(vec![at]), PointerPhase::Move, &HALF_SIZE);
        assert_eq!(mouse, touch);
        assert_eq!(mouse, Some(PointerEvent::Move(Point::new(200.0, 200.0))));
    }

    #[test]
    fn empty_touch_list_has_no_position() {
        let raw = RawPointer::Touch(Vec::new());
        assert_eq!(to_image_space(&raw, &HALF_SIZE), None);
        assert_eq!(normalize(&raw, PointerPhase::Down, &HALF_SIZE), None);
        assert_eq!(
            normalize(&raw, PointerPhase::Up, &HALF_SIZE),
            Some(PointerEvent::Up)
        );
    }

    #[test]
    fn unlaid_out_canvas_maps_nothing() {
        let layout = CanvasLayout {
            rendered_width: 0.0,
            rendered_height: 0.0,
            ..HALF_SIZE
        };
        assert!(!layout.is_laid_out());
        assert_eq!(layout.scale(), None);
        let raw = RawPointer::Mouse(ClientPoint::new(30.0, 50.0));
        assert_eq!(to_image_space(&raw, &layout), None);
        assert_eq!(
            normalize(&raw, PointerPhase::Cancel, &layout),
            Some(PointerEvent::Cancel)
        );
    }
}
