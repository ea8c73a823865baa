//! Video selection with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use kicklens_pipeline::SourceFile;
use kicklens_pipeline::types::{VIDEO_EXTENSIONS, is_supported_video};

/// `accept` attribute for the file input, e.g. `.mp4,.m4v,...`.
fn accept_attribute() -> String {
    VIDEO_EXTENSIONS
        .iter()
        .map(|(ext, _)| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Human-readable list of accepted formats.
fn formats_hint() -> String {
    VIDEO_EXTENSIONS
        .iter()
        .map(|(ext, _)| ext.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Props for the [`VideoUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct VideoUploadProps {
    /// Called with the selected video once its bytes are read.
    on_select: EventHandler<SourceFile>,
    /// Disable the picker (e.g. while an upload is in flight).
    #[props(default)]
    disabled: bool,
}

/// A drag-and-drop zone with a file picker button.
///
/// Only video files are accepted. Selecting a file does not upload it;
/// that is a separate, explicit action.
#[component]
pub fn VideoUpload(props: VideoUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut filename = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    let process_files = move |files: Vec<FileData>| async move {
        if let Some(file) = files.first() {
            let name = file.name();
            if !is_supported_video(&name) {
                error.set(Some(format!("Unsupported file type: {name}")));
                return;
            }
            match file.read_bytes().await {
                Ok(bytes) => {
                    filename.set(Some(name.clone()));
                    error.set(None);
                    props.on_select.call(SourceFile::new(name, bytes.to_vec()));
                }
                Err(e) => {
                    error.set(Some(format!("Failed to read file: {e}")));
                }
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        if !props.disabled {
            process_files(evt.files()).await;
        }
    };

    let zone_class = if dragging() {
        "upload-zone upload-zone--active"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref name) = filename() {
                p { class: "text-success", "Selected: {name}" }
            }

            if let Some(ref err) = error() {
                p { class: "text-error", "{err}" }
            }

            p { class: "text-secondary", "Drop a kick video here or " }

            label { class: "btn btn-primary",
                input {
                    r#type: "file",
                    accept: accept_attribute(),
                    class: "hidden",
                    disabled: props.disabled,
                    onchange: handle_files,
                }
                "Choose Video"
            }

            p { class: "text-muted text-sm", "{formats_hint()}" }
        }
    }
}
