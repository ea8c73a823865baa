//! One button per pipeline action, gated by upstream artifacts.

use dioxus::prelude::*;
use kicklens_pipeline::Action;

/// Props for the [`StageControls`] component.
#[derive(Props, Clone, PartialEq)]
pub struct StageControlsProps {
    /// Whether each action in [`Action::ALL`] order may start now.
    enabled: [bool; 4],
    /// The action currently in flight, if any.
    pending: Option<Action>,
    /// Fired when an enabled button is clicked.
    on_action: EventHandler<Action>,
}

/// Caption for `action`'s button: its pending text while in flight.
fn caption(action: Action, pending: Option<Action>) -> &'static str {
    if pending == Some(action) {
        action.pending_status()
    } else {
        action.title()
    }
}

/// Row of pipeline action buttons.
///
/// Disabled buttons carry a tooltip naming the blocked action.
#[component]
pub fn StageControls(props: StageControlsProps) -> Element {
    rsx! {
        div { class: "stage-controls",
            for (action, enabled) in Action::ALL.into_iter().zip(props.enabled) {
                {render_button(action, enabled, props.pending, &props.on_action)}
            }
        }
    }
}

/// Render a single action button.
fn render_button(
    action: Action,
    enabled: bool,
    pending: Option<Action>,
    on_action: &EventHandler<Action>,
) -> Element {
    let class = if pending == Some(action) {
        "btn btn-primary btn-pending"
    } else {
        "btn btn-primary"
    };
    let title = if enabled {
        String::new()
    } else {
        format!("Cannot {action} yet")
    };
    let onclick = {
        let on_action = *on_action;
        move |_| on_action.call(action)
    };

    rsx! {
        button {
            key: "{action:?}",
            class: "{class}",
            disabled: !enabled,
            title: "{title}",
            onclick: onclick,
            "{caption(action, pending)}"
        }
    }
}
