//! List of marked regions with per-row delete.

use dioxus::prelude::*;
use markscan_calibrate::{Region, RegionType};

/// Position and size in whole pixels.
fn describe(region: &Region) -> String {
    format!(
        "({:.0}, {:.0}) {:.0}\u{d7}{:.0}",
        region.x, region.y, region.width, region.height
    )
}

/// Props for the [`RegionList`] component.
#[derive(Props, Clone, PartialEq)]
pub struct RegionListProps {
    /// Regions in insertion order.
    regions: Vec<Region>,
    /// Called with the index of the region to remove.
    on_delete: EventHandler<usize>,
}

/// Marked regions, one row each.
#[component]
pub fn RegionList(props: RegionListProps) -> Element {
    rsx! {
        div { class: "region-list",
            h3 { "Marked Regions ({props.regions.len()})" }
            if props.regions.is_empty() {
                p { class: "muted", "No regions marked yet." }
            }
            for (index, region) in props.regions.iter().enumerate() {
                div {
                    key: "{index}-{region.question_id}",
                    class: match region.region_type {
                        RegionType::Mcq => "region-row mcq",
                        RegionType::Written => "region-row written",
                    },
                    span { class: "region-label", {region.label()} }
                    span { class: "muted", {describe(region)} }
                    button {
                        class: "btn danger",
                        onclick: move |_| props.on_delete.call(index),
                        "Delete"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_rounds_to_pixels() {
        let region = Region {
            question_id: "2".into(),
            region_type: RegionType::Written,
            x: 10.4,
            y: 20.6,
            width: 300.0,
            height: 49.6,
        };
        assert_eq!(describe(&region), "(10, 21) 300\u{d7}50");
    }
}
