//! Local video preview via Blob object URLs.
//!
//! The selected file is previewed straight from memory; it never
//! round-trips through the collaborator.

use kicklens_pipeline::SourceFile;
use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// Errors from browser media APIs.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// `window` or `document` is unavailable (not running in a page).
    #[error("no browser document available")]
    NoDocument,

    /// No element with the given id exists.
    #[error("element #{0} not found")]
    ElementNotFound(String),

    /// The element exists but is not a `<video>`.
    #[error("element #{0} is not a video element")]
    NotAVideo(String),
}

impl From<JsValue> for MediaError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Wrap the selected video in a Blob and return an object URL for a
/// `<video src>`.
///
/// The returned URL must be revoked via [`revoke_blob_url`] when the
/// preview is replaced.
///
/// # Errors
///
/// Returns [`MediaError::JsError`] if Blob or URL creation fails.
pub fn video_blob_url(file: &SourceFile) -> Result<String, MediaError> {
    let bytes = js_sys::Uint8Array::from(file.bytes());
    let parts = js_sys::Array::new();
    parts.push(&bytes);

    let opts = BlobPropertyBag::new();
    opts.set_type(file.mime_type());
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;

    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Revoke a Blob URL previously created by [`video_blob_url`].
pub fn revoke_blob_url(url: &str) {
    if let Err(e) = web_sys::Url::revoke_object_url(url) {
        tracing::warn!(url, error = ?e, "failed to revoke blob URL");
    }
}
