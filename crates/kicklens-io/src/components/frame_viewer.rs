//! Single-frame viewer with prev/next buttons and a thumbnail filmstrip.

use std::sync::Arc;

use dioxus::prelude::*;
use kicklens_pipeline::FrameNavigator;

/// Props for the [`FrameViewer`] component.
#[derive(Props, Clone)]
pub struct FrameViewerProps {
    /// Heading shown above the viewer.
    title: String,
    /// Navigator over the sequence to show.
    navigator: FrameNavigator,
    /// Base address artifact paths are resolved against.
    base_url: String,
    on_prev: EventHandler<()>,
    on_next: EventHandler<()>,
    /// Fired with the index of a clicked thumbnail.
    on_select: EventHandler<usize>,
}

impl PartialEq for FrameViewerProps {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.navigator.sequence(), other.navigator.sequence())
            && self.navigator.cursor() == other.navigator.cursor()
            && self.title == other.title
            && self.base_url == other.base_url
    }
}

/// "Frame i of n", or `None` when there is nothing to show.
fn position_label(navigator: &FrameNavigator) -> Option<String> {
    navigator
        .position()
        .map(|(i, n)| format!("Frame {i} of {n}"))
}

/// Shows the frame under the cursor at full size, with a strip of
/// thumbnails for direct selection.
///
/// Renders nothing while the sequence is empty.
#[component]
pub fn FrameViewer(props: FrameViewerProps) -> Element {
    let nav = &props.navigator;
    let (Some(current), Some(label)) = (nav.current_artifact(), position_label(nav)) else {
        return rsx! {};
    };
    let src = current.render_url(&props.base_url);
    let selected = nav.cursor().index();
    let on_prev = props.on_prev;
    let on_next = props.on_next;

    rsx! {
        section { class: "frame-viewer",
            h3 { "{props.title}" }

            img {
                class: "frame-main",
                src: "{src}",
                alt: "{label}",
            }

            div { class: "frame-nav",
                button {
                    class: "btn",
                    disabled: nav.is_first(),
                    onclick: move |_| on_prev.call(()),
                    "Previous"
                }
                span { class: "text-secondary", "{label}" }
                button {
                    class: "btn",
                    disabled: nav.is_last(),
                    onclick: move |_| on_next.call(()),
                    "Next"
                }
            }

            div { class: "filmstrip",
                for (index, artifact) in nav.sequence().iter().enumerate() {
                    {render_thumbnail(
                        artifact.render_url(&props.base_url),
                        index,
                        index == selected,
                        &props.on_select,
                    )}
                }
            }
        }
    }
}

/// Render a single filmstrip thumbnail.
fn render_thumbnail(
    src: String,
    index: usize,
    is_selected: bool,
    on_select: &EventHandler<usize>,
) -> Element {
    let class = if is_selected {
        "filmstrip-tile filmstrip-tile--selected"
    } else {
        "filmstrip-tile"
    };
    let onclick = {
        let on_select = *on_select;
        move |_| on_select.call(index)
    };
    let number = index + 1;

    rsx! {
        button {
            key: "{src}",
            class: "{class}",
            onclick: onclick,
            aria_label: "Show frame {number}",
            "aria-pressed": "{is_selected}",
            img { src: "{src}", alt: "Frame {number} thumbnail", loading: "lazy" }
        }
    }
}
