//! DOM side of pointer mapping.
//!
//! Reads the canvas geometry the core mapper needs and converts Dioxus
//! mouse and touch payloads into [`RawPointer`]s.

use dioxus::prelude::*;
use markscan_calibrate::mapper::{self, CanvasLayout, ClientPoint, PointerPhase, RawPointer};
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

/// Look up a mounted canvas by element id.
#[must_use]
pub fn canvas_by_id(id: &str) -> Option<HtmlCanvasElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlCanvasElement>()
        .ok()
}

/// Rendered and backing-store geometry of `canvas` right now.
#[must_use]
pub fn layout_of(canvas: &HtmlCanvasElement) -> CanvasLayout {
    let rect = canvas.get_bounding_client_rect();
    CanvasLayout {
        left: rect.left(),
        top: rect.top(),
        rendered_width: rect.width(),
        rendered_height: rect.height(),
        natural_width: f64::from(canvas.width()),
        natural_height: f64::from(canvas.height()),
    }
}

/// Mouse payload to raw input.
#[must_use]
pub fn from_mouse(data: &MouseData) -> RawPointer {
    let p = data.client_coordinates();
    RawPointer::Mouse(ClientPoint::new(p.x, p.y))
}

/// Touch payload to raw input; every active touch is kept in order.
#[must_use]
pub fn from_touch(data: &TouchData) -> RawPointer {
    RawPointer::Touch(
        data.touches()
            .iter()
            .map(|t| {
                let p = t.client_coordinates();
                ClientPoint::new(p.x, p.y)
            })
            .collect(),
    )
}

/// Map raw input over the canvas with `canvas_id` into an editor event.
///
/// `None` when the canvas is not mounted, not laid out, or a
/// down/move carries no position.
#[must_use]
pub fn normalize(
    canvas_id: &str,
    raw: &RawPointer,
    phase: PointerPhase,
) -> Option<markscan_calibrate::PointerEvent> {
    let canvas = canvas_by_id(canvas_id)?;
    mapper::normalize(raw, phase, &layout_of(&canvas))
}
