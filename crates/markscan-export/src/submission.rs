//! Upload body for a confirmed scan.
//!
//! The grading service takes the cropped sheet as a binary file part
//! plus the exam id, with the corner set attached as JSON metadata.

use markscan_calibrate::Corner;

use crate::ExportError;
use crate::data_url;

/// Everything the page sends after [`CornerScanner::confirm`].
///
/// [`CornerScanner::confirm`]: markscan_calibrate::CornerScanner::confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSubmission {
    /// Exam the sheet belongs to.
    pub exam_id: String,
    /// Media type of `image`.
    pub mime: String,
    /// Decoded crop bytes.
    pub image: Vec<u8>,
    /// Corners as `[{"x":..,"y":..,"label":"TL"}, ...]`.
    pub corners_json: String,
}

impl ScanSubmission {
    /// Decode the crop's data URL and serialize the corners.
    ///
    /// # Errors
    ///
    /// Propagates data URL and JSON failures.
    pub fn from_scan(
        exam_id: impl Into<String>,
        data_url: &str,
        corners: &[Corner; 4],
    ) -> Result<Self, ExportError> {
        let decoded = data_url::decode(data_url)?;
        Ok(Self {
            exam_id: exam_id.into(),
            mime: decoded.mime,
            image: decoded.bytes,
            corners_json: serde_json::to_string(corners)?,
        })
    }

    /// File name for the multipart image part.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "answer_sheet.png",
            _ => "answer_sheet.jpg",
        }
    }
}
