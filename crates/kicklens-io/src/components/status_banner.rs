//! Status line for the most recent pipeline action.

use dioxus::prelude::*;
use kicklens_pipeline::{Status, StatusKind};

/// Props for the [`StatusBanner`] component.
#[derive(Props, Clone, PartialEq)]
pub struct StatusBannerProps {
    status: Option<Status>,
}

const fn class_for(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Pending => "status status--pending",
        StatusKind::Success => "status status--success",
        StatusKind::Error => "status status--error",
    }
}

/// Shows the pending, success or error text of the last action.
#[component]
pub fn StatusBanner(props: StatusBannerProps) -> Element {
    let Some(status) = props.status else {
        return rsx! {};
    };
    let class = class_for(status.kind);

    rsx! {
        p {
            class: "{class}",
            role: "status",
            "aria-live": "polite",
            "{status.message}"
        }
    }
}
