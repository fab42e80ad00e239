//! Corner scanner view: canvas plus Reset / Cancel / Use This Scan.

use std::rc::Rc;

use dioxus::prelude::*;
use markscan_calibrate::{
    CornerScanner, DragState, PointerEvent, PointerPhase, RawPointer, RenderStyle, RgbaImage,
    ScanResult, ScannerConfig,
};

use crate::canvas::{self, SourceSurface};
use crate::pointer;

/// Element id of the scanner canvas.
pub const CANVAS_ID: &str = "markscan-corner-canvas";

/// Props for the [`CornerScannerView`] component.
#[derive(Props, Clone)]
pub struct CornerScannerViewProps {
    /// Decoded photo. Mount a fresh view (new `key`) for a new image.
    image: Rc<RgbaImage>,
    /// Scanner tunables.
    #[props(default)]
    config: ScannerConfig,
    /// Receives the crop and corners.
    on_confirm: EventHandler<ScanResult>,
    /// The user backed out.
    on_cancel: EventHandler<()>,
}

impl PartialEq for CornerScannerViewProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.image, &other.image) && self.config == other.config
    }
}

fn dispatch(mut scanner: Signal<CornerScanner>, raw: &RawPointer, phase: PointerPhase) {
    let Some(event) = pointer::normalize(CANVAS_ID, raw, phase) else {
        return;
    };
    // Hovering without a held corner changes nothing; skip the redraw.
    if matches!(event, PointerEvent::Move(_)) && scanner.peek().drag_state() == DragState::Idle {
        return;
    }
    scanner.write().handle_pointer(event);
}

/// Interactive quadrilateral crop over a photographed answer sheet.
#[component]
pub fn CornerScannerView(props: CornerScannerViewProps) -> Element {
    let image = Rc::clone(&props.image);
    let config = props.config.clone();
    let surface = use_hook(|| {
        SourceSurface::from_image(&image)
            .map(Rc::new)
            .map_err(|e| e.to_string())
    });
    let mut scanner = use_signal(|| {
        let mut s = CornerScanner::new(config);
        s.load((*image).clone());
        s
    });
    let mut notice = use_signal(|| Option::<String>::None);

    {
        let surface = surface.clone();
        use_effect(move || {
            let commands = scanner.read().render(&RenderStyle::default());
            if let Ok(ref source) = surface {
                canvas::redraw(CANVAS_ID, source, &commands);
            }
        });
    }

    let (width, height) = props.image.dimensions();

    rsx! {
        div { class: "editor",
            p { class: "hint", "Drag the blue corners to the edges of the answer sheet." }

            if let Err(ref e) = surface {
                p { class: "error", "Could not prepare the image: {e}" }
            }
            if let Some(ref msg) = notice() {
                p { class: "error", "{msg}" }
            }

            canvas {
                id: CANVAS_ID,
                class: "editor-canvas",
                width: "{width}",
                height: "{height}",
                onmousedown: move |evt: MouseEvent| {
                    dispatch(scanner, &pointer::from_mouse(&evt), PointerPhase::Down);
                },
                onmousemove: move |evt: MouseEvent| {
                    dispatch(scanner, &pointer::from_mouse(&evt), PointerPhase::Move);
                },
                onmouseup: move |evt: MouseEvent| {
                    dispatch(scanner, &pointer::from_mouse(&evt), PointerPhase::Up);
                },
                onmouseleave: move |evt: MouseEvent| {
                    dispatch(scanner, &pointer::from_mouse(&evt), PointerPhase::Cancel);
                },
                ontouchstart: move |evt: TouchEvent| {
                    evt.prevent_default();
                    dispatch(scanner, &pointer::from_touch(&evt), PointerPhase::Down);
                },
                ontouchmove: move |evt: TouchEvent| {
                    evt.prevent_default();
                    dispatch(scanner, &pointer::from_touch(&evt), PointerPhase::Move);
                },
                ontouchend: move |evt: TouchEvent| {
                    evt.prevent_default();
                    dispatch(scanner, &pointer::from_touch(&evt), PointerPhase::Up);
                },
                ontouchcancel: move |evt: TouchEvent| {
                    dispatch(scanner, &pointer::from_touch(&evt), PointerPhase::Cancel);
                },
            }

            div { class: "actions",
                button {
                    class: "btn",
                    onclick: move |_| {
                        scanner.write().reset_corners();
                        notice.set(None);
                    },
                    "Reset Corners"
                }
                button {
                    class: "btn",
                    onclick: move |_| props.on_cancel.call(()),
                    "Cancel"
                }
                button {
                    class: "btn primary",
                    onclick: move |_| {
                        let outcome = scanner.read().confirm();
                        match outcome {
                            Ok(result) => {
                                notice.set(None);
                                props.on_confirm.call(result);
                            }
                            Err(e) => notice.set(Some(e.to_string())),
                        }
                    },
                    "Use This Scan"
                }
            }
        }
    }
}
