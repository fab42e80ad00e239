//! Corner-based crop scanner.
//!
//! Holds a four-corner quadrilateral over a decoded photo. The user drags
//! corners into place, then [`CornerScanner::confirm`] produces the
//! bounding-box crop (see [`crate::crop`]) together with the corner set.
//!
//! State machine: `Idle -> Dragging(corner) -> Idle`. A loaded scanner
//! has no terminal state; it is reused until the image is replaced.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crop;
use crate::mapper::PointerEvent;
use crate::render::{DrawCommand, RenderStyle, TextAlign};
use crate::types::{CalibrateError, Dimensions, Point, Rect, RgbaImage};

/// Fixed identity of one quadrilateral vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerLabel {
    /// Top-left.
    TL,
    /// Top-right.
    TR,
    /// Bottom-right.
    BR,
    /// Bottom-left.
    BL,
}

impl CornerLabel {
    /// All labels in traversal order.
    pub const ALL: [Self; 4] = [Self::TL, Self::TR, Self::BR, Self::BL];

    /// Short label drawn inside the handle.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TL => "TL",
            Self::TR => "TR",
            Self::BR => "BR",
            Self::BL => "BL",
        }
    }
}

impl fmt::Display for CornerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled quadrilateral vertex in image-natural pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Which vertex this is.
    pub label: CornerLabel,
}

impl Corner {
    /// Position without the label.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Tunables for the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Inset of the default quadrilateral from each image edge.
    pub margin: f64,
    /// Maximum distance from a corner at which a press grabs it.
    pub pick_radius: f64,
}

impl ScannerConfig {
    /// Default inset in pixels.
    pub const DEFAULT_MARGIN: f64 = 50.0;
    /// Default grab radius in pixels.
    pub const DEFAULT_PICK_RADIUS: f64 = 30.0;

    /// Check that both values are finite, the margin non-negative and
    /// the pick radius positive.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::InvalidConfig`] naming the bad field.
    pub fn validate(&self) -> Result<(), CalibrateError> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(CalibrateError::InvalidConfig(format!(
                "margin must be a non-negative number, got {}",
                self.margin
            )));
        }
        if !self.pick_radius.is_finite() || self.pick_radius <= 0.0 {
            return Err(CalibrateError::InvalidConfig(format!(
                "pick_radius must be positive, got {}",
                self.pick_radius
            )));
        }
        Ok(())
    }

    /// Replace each out-of-range field with its default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let margin = if self.margin.is_finite() && self.margin >= 0.0 {
            self.margin
        } else {
            tracing::warn!(margin = self.margin, "invalid margin, using default");
            Self::DEFAULT_MARGIN
        };
        let pick_radius = if self.pick_radius.is_finite() && self.pick_radius > 0.0 {
            self.pick_radius
        } else {
            tracing::warn!(pick_radius = self.pick_radius, "invalid pick radius, using default");
            Self::DEFAULT_PICK_RADIUS
        };
        Self {
            margin,
            pick_radius,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            margin: Self::DEFAULT_MARGIN,
            pick_radius: Self::DEFAULT_PICK_RADIUS,
        }
    }
}

/// Centered rectangle inset by `margin`, clamped into the image.
///
/// Images smaller than `2 * margin` produce crossing or overlapping
/// corners; that is accepted rather than special-cased.
#[must_use]
pub fn default_corners(dimensions: Dimensions, margin: f64) -> [Corner; 4] {
    let w = f64::from(dimensions.width);
    let h = f64::from(dimensions.height);
    let positions = [
        Point::new(margin, margin),
        Point::new(w - margin, margin),
        Point::new(w - margin, h - margin),
        Point::new(margin, h - margin),
    ];
    let mut corners = [Corner {
        x: 0.0,
        y: 0.0,
        label: CornerLabel::TL,
    }; 4];
    for ((corner, label), pos) in corners.iter_mut().zip(CornerLabel::ALL).zip(positions) {
        let p = pos.clamp_to(dimensions);
        *corner = Corner {
            x: p.x,
            y: p.y,
            label,
        };
    }
    corners
}

/// Drag state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// No corner is held.
    #[default]
    Idle,
    /// The corner at this index follows the pointer.
    Dragging {
        /// Index into the corner array.
        corner: usize,
    },
}

/// What [`CornerScanner::confirm`] hands to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Bounding-box crop, transparent outside the quadrilateral.
    pub image: RgbaImage,
    /// Corner set the crop was taken with.
    pub corners: [Corner; 4],
}

#[derive(Debug, Clone)]
struct Loaded {
    image: Arc<RgbaImage>,
    corners: [Corner; 4],
}

/// Interactive quadrilateral crop tool.
///
/// Every operation before [`load`](Self::load) is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CornerScanner {
    config: ScannerConfig,
    loaded: Option<Loaded>,
    drag: DragState,
}

impl CornerScanner {
    /// Create an empty scanner.
    ///
    /// Invalid config fields fall back to their defaults (see
    /// [`ScannerConfig::sanitized`]); call [`ScannerConfig::validate`]
    /// first to reject them instead.
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config: config.sanitized(),
            loaded: None,
            drag: DragState::Idle,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Take ownership of a decoded image and place the default corners.
    ///
    /// Replaces any previous image and discards its corners.
    pub fn load(&mut self, image: RgbaImage) {
        let dimensions = Dimensions::of(&image);
        let corners = default_corners(dimensions, self.config.margin);
        tracing::debug!(%dimensions, "scanner loaded image");
        self.loaded = Some(Loaded {
            image: Arc::new(image),
            corners,
        });
        self.drag = DragState::Idle;
    }

    /// Drop the image and all geometry.
    pub fn clear(&mut self) {
        self.loaded = None;
        self.drag = DragState::Idle;
    }

    /// Whether an image is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The loaded image.
    #[must_use]
    pub fn source(&self) -> Option<&RgbaImage> {
        self.loaded.as_ref().map(|l| l.image.as_ref())
    }

    /// Natural dimensions of the loaded image.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.source().map(Dimensions::of)
    }

    /// Current corners.
    #[must_use]
    pub fn corners(&self) -> Option<&[Corner; 4]> {
        self.loaded.as_ref().map(|l| &l.corners)
    }

    /// Current drag state.
    #[must_use]
    pub const fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Restore the default inset quadrilateral.
    pub fn reset_corners(&mut self) {
        let margin = self.config.margin;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.corners = default_corners(Dimensions::of(&loaded.image), margin);
            self.drag = DragState::Idle;
            tracing::debug!("scanner corners reset");
        }
    }

    /// Index of the first corner strictly within the pick radius of
    /// `point`; ties go to the earlier corner.
    #[must_use]
    pub fn hit_test_corner(&self, point: Point) -> Option<usize> {
        let radius_sq = self.config.pick_radius * self.config.pick_radius;
        self.corners()?
            .iter()
            .position(|c| c.point().distance_squared(point) < radius_sq)
    }

    /// Start dragging the corner at `index`.
    ///
    /// Ignored if nothing is loaded, a drag is already active, or the
    /// index does not exist. Returns whether the drag started.
    pub fn begin_drag(&mut self, index: usize) -> bool {
        if self.drag != DragState::Idle || index >= self.corners().map_or(0, |c| c.len()) {
            return false;
        }
        self.drag = DragState::Dragging { corner: index };
        tracing::debug!(corner = index, "corner drag started");
        true
    }

    /// Move the dragged corner to `point`, clamped into the image.
    ///
    /// Returns whether a corner moved.
    pub fn update_drag(&mut self, point: Point) -> bool {
        let DragState::Dragging { corner } = self.drag else {
            return false;
        };
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };
        let p = point.clamp_to(Dimensions::of(&loaded.image));
        let Some(c) = loaded.corners.get_mut(corner) else {
            return false;
        };
        c.x = p.x;
        c.y = p.y;
        true
    }

    /// Release the dragged corner where it is.
    ///
    /// Returns whether a drag was active.
    pub fn end_drag(&mut self) -> bool {
        let was_dragging = self.drag != DragState::Idle;
        if let DragState::Dragging { corner } = self.drag {
            tracing::debug!(corner, "corner drag ended");
        }
        self.drag = DragState::Idle;
        was_dragging
    }

    /// Route a unified pointer event.
    ///
    /// A press grabs the corner under the pointer; moves follow it;
    /// release or cancel let go. Returns whether the state changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down(p) => self
                .hit_test_corner(p)
                .is_some_and(|index| self.begin_drag(index)),
            PointerEvent::Move(p) => self.update_drag(p),
            PointerEvent::Up | PointerEvent::Cancel => self.end_drag(),
        }
    }

    /// Crop the loaded image to the corners' bounding box, clipped to
    /// the quadrilateral.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::NoImage`] if nothing is loaded.
    pub fn crop(&self) -> Result<RgbaImage, CalibrateError> {
        let loaded = self.loaded.as_ref().ok_or(CalibrateError::NoImage)?;
        let polygon = loaded.corners.map(|c| c.point());
        Ok(crop::crop_to_polygon(&loaded.image, &polygon))
    }

    /// Crop and return the result with the corners used.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::NoImage`] if nothing is loaded.
    pub fn confirm(&self) -> Result<ScanResult, CalibrateError> {
        let image = self.crop()?;
        let corners = *self.corners().ok_or(CalibrateError::NoImage)?;
        tracing::info!(
            width = image.width(),
            height = image.height(),
            "scan confirmed"
        );
        Ok(ScanResult { image, corners })
    }

    /// Draw commands for the current state.
    ///
    /// Image, dimming overlay, transparent hole over the quadrilateral
    /// re-filled with the crisp image, outline, then labelled handles.
    /// Empty when nothing is loaded.
    #[must_use]
    pub fn render(&self, style: &RenderStyle) -> Vec<DrawCommand> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Vec::new();
        };
        let dims = Dimensions::of(&loaded.image);
        let polygon: Vec<Point> = loaded.corners.iter().map(Corner::point).collect();

        let mut cmds = vec![
            DrawCommand::Clear,
            DrawCommand::Image,
            DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, f64::from(dims.width), f64::from(dims.height)),
                color: style.overlay,
            },
            DrawCommand::ErasePolygon {
                polygon: polygon.clone(),
            },
            DrawCommand::ClippedImage {
                polygon: polygon.clone(),
            },
            DrawCommand::StrokePolygon {
                polygon,
                color: style.accent,
                width: style.outline_width,
            },
        ];
        for corner in &loaded.corners {
            let center = corner.point();
            cmds.push(DrawCommand::FillCircle {
                center,
                radius: style.handle_outer_radius,
                color: style.handle_ring,
            });
            cmds.push(DrawCommand::FillCircle {
                center,
                radius: style.handle_inner_radius,
                color: style.accent,
            });
            cmds.push(DrawCommand::Text {
                text: corner.label.as_str().to_owned(),
                position: center,
                color: style.handle_ring,
                size: style.handle_label_size,
                align: TextAlign::Center,
            });
        }
        cmds
    }
}
