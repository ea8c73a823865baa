//! Reading the playback position of the preview video.

use wasm_bindgen::JsCast;
use web_sys::HtmlVideoElement;

use crate::media::MediaError;

/// DOM id of the preview `<video>` element.
pub const VIDEO_ELEMENT_ID: &str = "kicklens-video";

/// Current playback position of the `<video>` with `element_id`, in
/// seconds.
///
/// # Errors
///
/// Returns [`MediaError::NoDocument`] outside a browser page,
/// [`MediaError::ElementNotFound`] if no element has that id, and
/// [`MediaError::NotAVideo`] if the element is not a `<video>`.
pub fn current_time(element_id: &str) -> Result<f64, MediaError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(MediaError::NoDocument)?;
    let element = document
        .get_element_by_id(element_id)
        .ok_or_else(|| MediaError::ElementNotFound(element_id.to_owned()))?;
    let video = element
        .dyn_into::<HtmlVideoElement>()
        .map_err(|_| MediaError::NotAVideo(element_id.to_owned()))?;
    Ok(video.current_time())
}
