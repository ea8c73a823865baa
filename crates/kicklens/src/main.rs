use std::rc::Rc;

use dioxus::prelude::*;
use kicklens_io::playback::{self, VIDEO_ELEMENT_ID};
use kicklens_io::{
    FrameViewer, QuadrantOverlay, StageControls, StatusBanner, VideoPlayer, VideoUpload, media,
};
use kicklens_pipeline::{
    Action, Collaborator, Command, PipelineController, QuadrantVisualizer, SequenceKind,
    SourceFile,
};
use kicklens_remote::{HttpCollaborator, RemoteConfig};

const TAGLINE: &str =
    "Upload a penalty kick, mark the strike, and see where the ball is likely headed";

fn main() {
    dioxus::launch(app);
}

/// Root application component.
///
/// Holds the single [`PipelineController`] in a signal and wires the
/// picker, preview, action buttons, frame viewers, and overlay to it.
/// Every remote call runs in a spawned task between the controller's
/// `begin` and `complete`, so the signal is never borrowed across an
/// await.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut controller = use_signal(PipelineController::new);
    let mut preview_url = use_signal(|| Option::<String>::None);
    let mut local_error = use_signal(|| Option::<String>::None);
    let client = use_hook(|| HttpCollaborator::new(RemoteConfig::default()).map(Rc::new));
    let visualizer = QuadrantVisualizer::default();

    let client = match client {
        Ok(client) => client,
        Err(e) => {
            return rsx! {
                p { class: "status status--error", "{e}" }
            };
        }
    };
    let base_url = client.config().base_url.clone();

    // --- File selection ---
    let on_select = move |file: SourceFile| {
        match media::video_blob_url(&file) {
            Ok(url) => {
                let old = preview_url.write().replace(url);
                if let Some(old) = old {
                    media::revoke_blob_url(&old);
                }
                local_error.set(None);
            }
            Err(e) => local_error.set(Some(format!("Cannot preview video: {e}"))),
        }
        controller.write().select_file(file);
    };

    // --- Pipeline actions ---
    let on_action = {
        let client = Rc::clone(&client);
        move |action: Action| {
            let command = match action {
                Action::Upload => Command::Upload,
                Action::Extract => match playback::current_time(VIDEO_ELEMENT_ID) {
                    Ok(timestamp) => Command::ExtractFrames { timestamp },
                    Err(e) => {
                        local_error.set(Some(format!("Cannot read playback position: {e}")));
                        return;
                    }
                },
                Action::Detect => Command::DetectPose,
                Action::Predict => Command::PredictDirection,
            };
            local_error.set(None);

            // Gate and busy rejections are reflected in the controller
            // status (or in the disabled buttons); nothing to dispatch.
            let Ok(ticket) = controller.write().begin(command) else {
                return;
            };

            let client = Rc::clone(&client);
            spawn(async move {
                let result = client.dispatch(ticket.request()).await;
                if let Err(e) = controller.write().complete(ticket, result) {
                    tracing::debug!(error = %e, "action did not commit");
                }
            });
        }
    };

    // --- Derived view state ---
    let c = controller.read();
    let enabled = Action::ALL.map(|action| c.can(action));
    let pending = c.pending_action();
    let status = c.status().cloned();
    let stage = c.stage();
    let frames = c.navigator(SequenceKind::Frames).clone();
    let annotated = c.navigator(SequenceKind::AnnotatedFrames).clone();
    let grid = c.probabilities().map(|p| visualizer.render(p));
    drop(c);

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/main.css") }

        div { class: "app",
            header { class: "app-header",
                h1 { "kicklens" }
                p { class: "text-muted",
                    "{TAGLINE}"
                }
            }

            main { class: "app-main",
                section { class: "panel",
                    VideoUpload {
                        on_select: on_select,
                        disabled: pending == Some(Action::Upload),
                    }

                    if let Some(ref src) = preview_url() {
                        VideoPlayer { src: src.clone() }
                    }

                    StageControls {
                        enabled: enabled,
                        pending: pending,
                        on_action: on_action,
                    }

                    p { class: "text-secondary text-sm", "Stage: {stage}" }

                    StatusBanner { status: status }

                    if let Some(ref err) = local_error() {
                        p { class: "status status--error", "{err}" }
                    }
                }

                section { class: "panel",
                    FrameViewer {
                        title: SequenceKind::Frames.label().to_owned(),
                        navigator: frames,
                        base_url: base_url.clone(),
                        on_prev: move |()| {
                            controller.write().navigator_mut(SequenceKind::Frames).prev();
                        },
                        on_next: move |()| {
                            controller.write().navigator_mut(SequenceKind::Frames).next();
                        },
                        on_select: move |index| {
                            controller.write().navigator_mut(SequenceKind::Frames).select(index);
                        },
                    }

                    FrameViewer {
                        title: SequenceKind::AnnotatedFrames.label().to_owned(),
                        navigator: annotated,
                        base_url: base_url,
                        on_prev: move |()| {
                            controller.write().navigator_mut(SequenceKind::AnnotatedFrames).prev();
                        },
                        on_next: move |()| {
                            controller.write().navigator_mut(SequenceKind::AnnotatedFrames).next();
                        },
                        on_select: move |index| {
                            controller
                                .write()
                                .navigator_mut(SequenceKind::AnnotatedFrames)
                                .select(index);
                        },
                    }

                    if let Some(grid) = grid {
                        QuadrantOverlay { grid: grid }
                    }
                }
            }
        }
    }
}
