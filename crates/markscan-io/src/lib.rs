//! markscan-io: Browser I/O and Dioxus component library.
//!
//! Maps DOM mouse and touch input onto the calibration editors, executes
//! their draw commands on a 2D canvas, triggers payload downloads, and
//! provides the editor components used by the markscan web app.

pub mod canvas;
pub mod components;
pub mod download;
pub mod pointer;

pub use components::{CornerScannerView, FileUpload, RegionList, RegionMarkerView};
