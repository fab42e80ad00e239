//! markscan-export: Pure serializers for calibration results (sans-IO)
//!
//! Turns a confirmed scan into an upload body (crop as a `data:` URL,
//! decoded bytes, corner metadata) and a region payload into JSON.

mod error;

pub mod data_url;
pub mod payload;
pub mod submission;

pub use data_url::{DataUrl, DataUrlFormat};
pub use error::ExportError;
pub use submission::ScanSubmission;
