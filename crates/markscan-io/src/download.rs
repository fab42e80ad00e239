//! Browser file download for saved region payloads.
//!
//! Wraps the text in a `Blob`, points a throwaway `<a download>` at its
//! object URL, clicks it, then cleans up.
//!
//! Requires a browser environment (`wasm32-unknown-unknown`).

use markscan_calibrate::RegionPayload;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::BlobPropertyBag;

/// Errors that can occur when triggering a file download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// The payload could not be serialized.
    #[error(transparent)]
    Export(#[from] markscan_export::ExportError),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Offer `data` to the user as a file named `filename`.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if a browser API call fails.
pub fn trigger_download(data: &str, filename: &str, mime_type: &str) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;
    let body = document
        .body()
        .ok_or_else(|| DownloadError::JsError("no document body".into()))?;

    let parts = js_sys::Array::of1(&JsValue::from_str(data));
    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &opts)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| DownloadError::JsError(format!("failed to cast element: {e:?}")))?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    body.append_child(&anchor)?;
    anchor.click();

    // The download has started; cleanup failures are not reported.
    let _ = body.remove_child(&anchor);
    let _ = web_sys::Url::revoke_object_url(&url);
    Ok(())
}

/// Download `payload` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`DownloadError`] if serialization or the download fails.
pub fn download_payload(payload: &RegionPayload, filename: &str) -> Result<(), DownloadError> {
    let json = markscan_export::payload::to_json(payload, true)?;
    trigger_download(&json, filename, "application/json")?;
    tracing::info!(filename, regions = payload.regions.len(), "payload downloaded");
    Ok(())
}
