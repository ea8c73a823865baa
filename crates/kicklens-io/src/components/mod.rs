//! Dioxus UI components for kicklens.
//!
//! Provides the video picker and preview, the pipeline action buttons,
//! frame viewers with a thumbnail filmstrip, the quadrant overlay, and
//! the status line.

mod frame_viewer;
mod quadrant_overlay;
mod stage_controls;
mod status_banner;
mod upload;
mod video_player;

pub use frame_viewer::FrameViewer;
pub use quadrant_overlay::QuadrantOverlay;
pub use stage_controls::StageControls;
pub use status_banner::StatusBanner;
pub use upload::VideoUpload;
pub use video_player::VideoPlayer;
