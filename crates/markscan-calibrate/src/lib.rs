//! markscan-calibrate: geometry core for answer-sheet calibration (sans-IO).
//!
//! Two interactive editors over a raster image:
//!
//! - [`CornerScanner`]: a four-corner quadrilateral the user drags around a
//!   photographed answer sheet, producing a bounding-box crop.
//! - [`RegionMarker`]: typed rectangles drawn over an exam template (one
//!   multiple-choice region, numbered written regions), saved as a
//!   [`RegionPayload`].
//!
//! Both editors take [`PointerEvent`]s already mapped into image-natural
//! pixel space by [`mapper`] and describe their appearance as a list of
//! [`DrawCommand`]s, re-generated on every change.
//!
//! This crate has **no I/O dependencies**. Canvas access, DOM events and
//! file handling live in `markscan-io`.

pub mod crop;
pub mod mapper;
pub mod marker;
pub mod payload;
pub mod raster;
pub mod render;
pub mod scanner;
pub mod source;
pub mod types;

pub use mapper::{CanvasLayout, ClientPoint, PointerEvent, PointerPhase, RawPointer};
pub use marker::{DraftRegion, DrawState, MarkerConfig, Region, RegionMarker, RegionType};
pub use payload::{RegionEntry, RegionPayload};
pub use render::{DrawCommand, RenderStyle, Rgba, TextAlign};
pub use scanner::{Corner, CornerLabel, CornerScanner, DragState, ScanResult, ScannerConfig};
pub use types::{BoundingBox, CalibrateError, Dimensions, Point, Rect, RgbaImage};
