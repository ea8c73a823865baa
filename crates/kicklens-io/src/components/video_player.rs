//! Local preview of the selected video.

use dioxus::prelude::*;

use crate::playback::VIDEO_ELEMENT_ID;

/// Props for the [`VideoPlayer`] component.
#[derive(Props, Clone, PartialEq)]
pub struct VideoPlayerProps {
    /// Object URL of the selected file.
    src: String,
}

/// A `<video>` with native controls, addressable by
/// [`VIDEO_ELEMENT_ID`] so the playback position can be read when
/// extracting frames.
#[component]
pub fn VideoPlayer(props: VideoPlayerProps) -> Element {
    rsx! {
        video {
            id: VIDEO_ELEMENT_ID,
            class: "video-player",
            src: "{props.src}",
            controls: true,
            preload: "metadata",
        }
    }
}
