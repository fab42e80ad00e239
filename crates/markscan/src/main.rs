use std::rc::Rc;

use dioxus::prelude::*;
use markscan_calibrate::{RegionPayload, RgbaImage, ScanResult, source};
use markscan_export::{DataUrlFormat, ExportError, ScanSubmission, data_url};
use markscan_io::{CornerScannerView, FileUpload, RegionMarkerView, download};

/// Page styles. Canvases keep their natural-resolution backing store
/// and are scaled down by CSS; the pointer mapping compensates.
const STYLE: &str = r"
:root { --accent: #3b82f6; --muted: #6b7280; --error: #dc2626; --border: #e5e7eb; }
body { margin: 0; font-family: system-ui, sans-serif; color: #111827; background: #f9fafb; }
header { padding: 1rem 1.5rem; border-bottom: 1px solid var(--border); background: #fff; }
header h1 { margin: 0; font-size: 1.5rem; }
main { max-width: 1100px; margin: 0 auto; padding: 1.5rem; display: flex; flex-direction: column; gap: 1rem; }
.tabs, .actions { display: flex; flex-wrap: wrap; gap: 0.5rem; }
.btn { padding: 0.5rem 1rem; border: 1px solid var(--border); border-radius: 0.375rem; background: #fff; cursor: pointer; font-weight: 500; }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.btn.primary, .btn.active { background: var(--accent); border-color: var(--accent); color: #fff; }
.btn.danger { color: var(--error); }
.upload-zone { border: 2px dashed var(--border); border-radius: 0.5rem; padding: 1.5rem; text-align: center; background: #fff; }
.upload-zone.dragging { border-color: var(--accent); background: #eff6ff; }
.hidden { display: none; }
.muted, .hint { color: var(--muted); }
.error { color: var(--error); }
.editor { display: flex; flex-direction: column; gap: 0.75rem; }
.editor-canvas { max-width: 100%; height: auto; border: 1px solid var(--border); touch-action: none; cursor: pointer; }
.editor-canvas.crosshair { cursor: crosshair; }
.region-list { background: #fff; border: 1px solid var(--border); border-radius: 0.5rem; padding: 0.75rem; }
.region-row { display: flex; align-items: center; gap: 0.75rem; padding: 0.25rem 0; border-left: 4px solid; padding-left: 0.5rem; margin: 0.25rem 0; }
.region-row.mcq { border-color: #3b82f6; }
.region-row.written { border-color: #10b981; }
.region-label { font-weight: 600; flex: 1; }
.result img { max-width: 100%; border: 1px solid var(--border); }
pre { background: #111827; color: #e5e7eb; padding: 0.75rem; border-radius: 0.375rem; overflow-x: auto; }
";

fn main() {
    dioxus::launch(app);
}

/// Which editor the page hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Student side: crop a photographed answer sheet.
    Scan,
    /// Exam author side: mark regions on a template.
    Calibrate,
}

impl Mode {
    const fn tab_label(self) -> &'static str {
        match self {
            Self::Scan => "Scan Answer Sheet",
            Self::Calibrate => "Calibrate Template",
        }
    }

    const fn upload_prompt(self) -> &'static str {
        match self {
            Self::Scan => "Take or upload a photo of the answer sheet",
            Self::Calibrate => "Upload a blank exam template",
        }
    }
}

/// What the page shows after a scan is confirmed.
#[derive(Debug, Clone, PartialEq)]
struct ScanOutcome {
    data_url: String,
    width: u32,
    height: u32,
    submission: ScanSubmission,
}

impl ScanOutcome {
    fn build(result: &ScanResult, exam_id: String) -> Result<Self, ExportError> {
        let data_url = data_url::encode(&result.image, DataUrlFormat::default())?;
        let submission = ScanSubmission::from_scan(exam_id, &data_url, &result.corners)?;
        Ok(Self {
            data_url,
            width: result.image.width(),
            height: result.image.height(),
            submission,
        })
    }
}

/// Root application component.
///
/// Owns the uploaded image and the results; each editor owns its own
/// geometry and is remounted (via `key`) whenever a new image decodes.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut mode = use_signal(|| Mode::Scan);
    let mut exam_id = use_signal(|| String::from("exam-1"));
    let mut upload = use_signal(|| Option::<Vec<u8>>::None);
    let mut image = use_signal(|| Option::<Rc<RgbaImage>>::None);
    let mut decoding = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);
    let mut generation = use_signal(|| 0u64);
    let mut scan = use_signal(|| Option::<ScanOutcome>::None);
    let mut saved = use_signal(|| Option::<(RegionPayload, String)>::None);

    let mut clear = move || {
        // Invalidate any decode still in flight.
        generation += 1;
        decoding.set(false);
        upload.set(None);
        image.set(None);
        scan.set(None);
        saved.set(None);
        error.set(None);
    };

    let on_upload = move |(bytes, name): (Vec<u8>, String)| {
        tracing::info!(%name, bytes = bytes.len(), "image selected");
        upload.set(Some(bytes));
    };

    // --- Decode effect ---
    // Editors must not accept input before the image has decoded, so
    // they are only mounted once `image` is set.
    use_effect(move || {
        let Some(bytes) = upload() else {
            return;
        };

        generation += 1;
        let my_generation = *generation.peek();
        decoding.set(true);
        error.set(None);
        image.set(None);

        spawn(async move {
            // Let the "Decoding..." state paint before blocking.
            gloo_timers::future::TimeoutFuture::new(0).await;

            let outcome = source::decode(&bytes);
            if *generation.peek() != my_generation {
                return;
            }
            match outcome {
                Ok(img) => image.set(Some(Rc::new(img))),
                Err(e) => {
                    tracing::warn!(error = %e, "image decode failed");
                    error.set(Some(e.to_string()));
                }
            }
            decoding.set(false);
        });
    });

    let on_confirm = move |result: ScanResult| {
        match ScanOutcome::build(&result, exam_id.peek().clone()) {
            Ok(outcome) => {
                tracing::info!(
                    exam_id = %outcome.submission.exam_id,
                    bytes = outcome.submission.image.len(),
                    "scan ready for submission"
                );
                scan.set(Some(outcome));
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let on_save = move |payload: RegionPayload| {
        match markscan_export::payload::to_json(&payload, true) {
            Ok(json) => saved.set(Some((payload, json))),
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let on_download = move |_| {
        if let Some((ref payload, _)) = *saved.read() {
            let name = format!("{}-regions.json", exam_id.peek());
            if let Err(e) = download::download_payload(payload, &name) {
                error.set(Some(format!("Download failed: {e}")));
            }
        }
    };

    let editor_key = generation();

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: STYLE }

        header {
            h1 { "markscan" }
            p { class: "muted", "Answer-sheet scanning and exam region calibration" }
        }

        main {
            div { class: "tabs",
                for m in [Mode::Scan, Mode::Calibrate] {
                    button {
                        key: "{m:?}",
                        class: if mode() == m { "btn active" } else { "btn" },
                        onclick: move |_| {
                            if mode() != m {
                                clear();
                                mode.set(m);
                            }
                        },
                        {m.tab_label()}
                    }
                }
            }

            label {
                "Exam ID "
                input {
                    value: "{exam_id}",
                    oninput: move |evt| exam_id.set(evt.value()),
                }
            }

            if let Some(ref err) = error() {
                p { class: "error", "{err}" }
            }

            if decoding() {
                p { class: "muted", "Decoding image..." }
            } else if mode() == Mode::Scan {
                if let Some(ref outcome) = scan() {
                    div { class: "result",
                        h2 { "Scan ready" }
                        img { src: "{outcome.data_url}", alt: "Cropped answer sheet" }
                        p {
                            {format!(
                                "{}x{} crop, {} bytes as {} for exam {}",
                                outcome.width,
                                outcome.height,
                                outcome.submission.image.len(),
                                outcome.submission.file_name(),
                                outcome.submission.exam_id,
                            )}
                        }
                        h3 { "Corners" }
                        pre { "{outcome.submission.corners_json}" }
                        button { class: "btn", onclick: move |_| clear(), "Scan Another" }
                    }
                } else if let Some(ref img) = image() {
                    CornerScannerView {
                        key: "{editor_key}",
                        image: Rc::clone(img),
                        on_confirm,
                        on_cancel: move |()| clear(),
                    }
                } else {
                    FileUpload { prompt: Mode::Scan.upload_prompt(), on_upload }
                }
            } else if let Some((_, ref json)) = saved() {
                div { class: "result",
                    h2 { "Regions saved" }
                    pre { "{json}" }
                    div { class: "actions",
                        button { class: "btn primary", onclick: on_download, "Download JSON" }
                        button {
                            class: "btn",
                            onclick: move |_| clear(),
                            "Calibrate Another Template"
                        }
                    }
                }
            } else if let Some(ref img) = image() {
                RegionMarkerView {
                    key: "{editor_key}",
                    image: Rc::clone(img),
                    on_save,
                    on_change_image: move |()| clear(),
                }
            } else {
                FileUpload { prompt: Mode::Calibrate.upload_prompt(), on_upload }
            }
        }
    }
}
