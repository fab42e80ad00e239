//! Dioxus UI components for markscan.
//!
//! The image picker, both calibration editors, and the region list the
//! marker embeds.

mod corner_scanner;
mod region_list;
mod region_marker;
mod upload;

pub use corner_scanner::{CANVAS_ID as CORNER_CANVAS_ID, CornerScannerView};
pub use region_list::RegionList;
pub use region_marker::{CANVAS_ID as REGION_CANVAS_ID, RegionMarkerView};
pub use upload::FileUpload;
