//! Image picker with drag-and-drop.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

/// Extensions the decoder is built for.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// `accept` attribute for the picker, matching [`ALLOWED_EXTENSIONS`].
const ACCEPT: &str = ".png,.jpg,.jpeg,.bmp,.webp";

fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Prompt shown above the picker, e.g. "Upload answer sheet".
    #[props(into)]
    prompt: String,
    /// Called with `(bytes, filename)` once a file has been read.
    on_upload: EventHandler<(Vec<u8>, String)>,
}

/// Drop zone and file picker for a single image.
///
/// Rejects files whose extension the decoder does not handle before
/// reading them.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);

    let read_first = move |files: Vec<FileData>| async move {
        let Some(file) = files.first() else {
            return;
        };
        let name = file.name();
        if !has_allowed_extension(&name) {
            error.set(Some(format!("Unsupported file type: {name}")));
            return;
        }
        match file.read_bytes().await {
            Ok(bytes) => {
                error.set(None);
                props.on_upload.call((bytes.to_vec(), name));
            }
            Err(e) => error.set(Some(format!("Failed to read file: {e}"))),
        }
    };

    let zone_class = if dragging() {
        "upload-zone dragging"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: zone_class,
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| dragging.set(false),
            ondrop: move |evt: DragEvent| async move {
                evt.prevent_default();
                dragging.set(false);
                read_first(evt.files()).await;
            },

            p { class: "upload-prompt", "{props.prompt}" }

            if let Some(ref err) = error() {
                p { class: "error", "{err}" }
            }

            label { class: "btn primary",
                input {
                    r#type: "file",
                    accept: ACCEPT,
                    class: "hidden",
                    onchange: move |evt: FormEvent| async move {
                        read_first(evt.files()).await;
                    },
                }
                "Choose Image"
            }
            p { class: "muted", "PNG, JPEG, BMP, WebP" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("sheet.JPG"));
        assert!(has_allowed_extension("scan.v2.webp"));
        assert!(!has_allowed_extension("notes.pdf"));
        assert!(!has_allowed_extension("README"));
    }

    #[test]
    fn picker_accepts_exactly_the_decodable_extensions() {
        let accepted: Vec<&str> = ACCEPT
            .split(',')
            .map(|e| e.trim_start_matches('.'))
            .collect();
        assert_eq!(accepted, ALLOWED_EXTENSIONS);
        assert!(ACCEPT.split(',').all(has_allowed_extension));
    }
}
