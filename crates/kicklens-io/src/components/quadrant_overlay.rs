//! Goal-mouth overlay tinting each of the six quadrants by intensity.

use dioxus::prelude::*;
use kicklens_pipeline::{QuadrantCell, QuadrantGrid};

/// Default overlay size in CSS pixels.
pub const DEFAULT_WIDTH: f64 = 600.0;
pub const DEFAULT_HEIGHT: f64 = 400.0;

/// Stroke width of the drawn posts and crossbar.
const POST_WIDTH: f64 = 8.0;

/// Props for the [`QuadrantOverlay`] component.
#[derive(Props, Clone, PartialEq)]
pub struct QuadrantOverlayProps {
    grid: QuadrantGrid,
    #[props(default = DEFAULT_WIDTH)]
    width: f64,
    #[props(default = DEFAULT_HEIGHT)]
    height: f64,
}

/// Cell caption: label and rounded percentage.
fn cell_caption(cell: &QuadrantCell) -> String {
    format!("{} {:.1}%", cell.quadrant.label(), cell.percent())
}

/// A 2x3 goal grid where each cell's fill opacity is its intensity.
///
/// Geometry scales with `width`/`height`; cell placement never changes.
#[component]
pub fn QuadrantOverlay(props: QuadrantOverlayProps) -> Element {
    let QuadrantOverlayProps {
        grid,
        width,
        height,
    } = props;
    let dominant = grid.dominant;
    let inset = POST_WIDTH / 2.0;
    let frame_path = format!("M {inset} {height} V {inset} H {} V {height}", width - inset);

    rsx! {
        figure { class: "quadrant-overlay",
            svg {
                width: "{width}",
                height: "{height}",
                view_box: "0 0 {width} {height}",
                role: "img",
                "aria-label": "Predicted kick direction",

                rect {
                    x: "0",
                    y: "0",
                    width: "{width}",
                    height: "{height}",
                    class: "goal-net",
                }

                for cell in grid.cells {
                    {render_cell(&cell, width, height, dominant == Some(cell.quadrant))}
                }

                // Posts and crossbar.
                path {
                    d: "{frame_path}",
                    class: "goal-frame",
                    stroke_width: "{POST_WIDTH}",
                    fill: "none",
                }
            }

            if let Some(q) = dominant {
                figcaption { class: "text-secondary", "Most likely: {q}" }
            }
        }
    }
}

fn render_cell(cell: &QuadrantCell, width: f64, height: f64, dominant: bool) -> Element {
    let rect = cell.rect(width, height);
    let caption = cell_caption(cell);
    let class = if dominant {
        "quadrant-cell quadrant-cell--dominant"
    } else {
        "quadrant-cell"
    };
    let cx = rect.x + rect.width / 2.0;
    let cy = rect.y + rect.height / 2.0;

    rsx! {
        g { key: "{cell.quadrant:?}",
            rect {
                x: "{rect.x}",
                y: "{rect.y}",
                width: "{rect.width}",
                height: "{rect.height}",
                class: "{class}",
                fill_opacity: "{cell.intensity}",
            }
            text {
                x: "{cx}",
                y: "{cy}",
                text_anchor: "middle",
                dominant_baseline: "middle",
                class: "quadrant-label",
                "{caption}"
            }
        }
    }
}
