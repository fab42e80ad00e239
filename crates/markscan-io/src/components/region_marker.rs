//! Region marker view: type toggle, canvas, region list, save.

use std::rc::Rc;

use dioxus::prelude::*;
use markscan_calibrate::{
    Dimensions, MarkerConfig, PointerPhase, RawPointer, RegionMarker, RegionPayload, RegionType,
    RenderStyle, RgbaImage,
};

use crate::canvas::{self, SourceSurface};
use crate::components::RegionList;
use crate::pointer;

/// Element id of the marker canvas.
pub const CANVAS_ID: &str = "markscan-region-canvas";

/// Props for the [`RegionMarkerView`] component.
#[derive(Props, Clone)]
pub struct RegionMarkerViewProps {
    /// Decoded exam template. Mount a fresh view for a new image.
    image: Rc<RgbaImage>,
    /// Marker tunables.
    #[props(default)]
    config: MarkerConfig,
    /// Receives the payload after a successful save.
    on_save: EventHandler<RegionPayload>,
    /// The user wants to start over with another template.
    on_change_image: EventHandler<()>,
}

impl PartialEq for RegionMarkerViewProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.image, &other.image) && self.config == other.config
    }
}

fn dispatch(
    mut marker: Signal<RegionMarker>,
    mut notice: Signal<Option<String>>,
    raw: &RawPointer,
    phase: PointerPhase,
) {
    let Some(event) = pointer::normalize(CANVAS_ID, raw, phase) else {
        return;
    };
    if phase == PointerPhase::Move && marker.peek().draft().is_none() {
        return;
    }
    let outcome = marker.write().handle_pointer(event);
    if let Err(e) = outcome {
        notice.set(Some(e.to_string()));
    }
}

/// Draw and manage exam regions over a template image.
#[component]
pub fn RegionMarkerView(props: RegionMarkerViewProps) -> Element {
    let image = Rc::clone(&props.image);
    let config = props.config.clone();
    let surface = use_hook(|| {
        SourceSurface::from_image(&image)
            .map(Rc::new)
            .map_err(|e| e.to_string())
    });
    let mut marker = use_signal(|| {
        let mut m = RegionMarker::new(config);
        m.load(Dimensions::of(&image));
        m
    });
    let mut notice = use_signal(|| Option::<String>::None);

    {
        let surface = surface.clone();
        use_effect(move || {
            let commands = marker.read().render(&RenderStyle::default());
            if let Ok(ref source) = surface {
                canvas::redraw(CANVAS_ID, source, &commands);
            }
        });
    }

    let (width, height) = props.image.dimensions();
    let active = marker.read().active_type();
    let can_select_mcq = marker.read().can_select_mcq();
    let active_label = marker.read().active_label();
    let regions = marker.read().regions().to_vec();

    let toggle_class = |kind: RegionType| {
        if active == kind { "btn toggle active" } else { "btn toggle" }
    };

    rsx! {
        div { class: "editor",
            div { class: "actions",
                button {
                    class: toggle_class(RegionType::Mcq),
                    disabled: !can_select_mcq,
                    onclick: move |_| {
                        marker.write().set_active_type(RegionType::Mcq);
                    },
                    if can_select_mcq { "MCQ Section" } else { "MCQ Section ✓" }
                }
                button {
                    class: toggle_class(RegionType::Written),
                    onclick: move |_| {
                        marker.write().set_active_type(RegionType::Written);
                    },
                    "Written Question"
                }
            }
            p { class: "hint", "Currently marking: {active_label}" }

            if let Err(ref e) = surface {
                p { class: "error", "Could not prepare the image: {e}" }
            }
            if let Some(ref msg) = notice() {
                p { class: "error", "{msg}" }
            }

            canvas {
                id: CANVAS_ID,
                class: "editor-canvas crosshair",
                width: "{width}",
                height: "{height}",
                onmousedown: move |evt: MouseEvent| {
                    notice.set(None);
                    dispatch(marker, notice, &pointer::from_mouse(&evt), PointerPhase::Down);
                },
                onmousemove: move |evt: MouseEvent| {
                    dispatch(marker, notice, &pointer::from_mouse(&evt), PointerPhase::Move);
                },
                onmouseup: move |evt: MouseEvent| {
                    dispatch(marker, notice, &pointer::from_mouse(&evt), PointerPhase::Up);
                },
                onmouseleave: move |evt: MouseEvent| {
                    dispatch(marker, notice, &pointer::from_mouse(&evt), PointerPhase::Cancel);
                },
                ontouchstart: move |evt: TouchEvent| {
                    evt.prevent_default();
                    notice.set(None);
                    dispatch(marker, notice, &pointer::from_touch(&evt), PointerPhase::Down);
                },
                ontouchmove: move |evt: TouchEvent| {
                    evt.prevent_default();
                    dispatch(marker, notice, &pointer::from_touch(&evt), PointerPhase::Move);
                },
                ontouchend: move |evt: TouchEvent| {
                    evt.prevent_default();
                    dispatch(marker, notice, &pointer::from_touch(&evt), PointerPhase::Up);
                },
                ontouchcancel: move |evt: TouchEvent| {
                    dispatch(marker, notice, &pointer::from_touch(&evt), PointerPhase::Cancel);
                },
            }

            RegionList {
                regions,
                on_delete: move |index: usize| {
                    marker.write().delete_region(index);
                },
            }

            div { class: "actions",
                button {
                    class: "btn primary",
                    onclick: move |_| {
                        let outcome = marker.read().save();
                        match outcome {
                            Ok(payload) => {
                                notice.set(None);
                                props.on_save.call(payload);
                            }
                            Err(e) => notice.set(Some(e.to_string())),
                        }
                    },
                    "Save Regions"
                }
                button {
                    class: "btn",
                    onclick: move |_| props.on_change_image.call(()),
                    "Upload Different Image"
                }
            }
        }
    }
}
