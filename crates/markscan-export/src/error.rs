/// Errors from the export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The string is not a `data:` URL.
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(&'static str),

    /// The base64 payload of a data URL is invalid.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Raster encoding failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A decoded region payload breaks the region-set rules.
    #[error("invalid region payload: {0}")]
    InvalidPayload(#[from] markscan_calibrate::CalibrateError),
}
