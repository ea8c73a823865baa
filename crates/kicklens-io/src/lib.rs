//! kicklens-io: Browser I/O and Dioxus component library.
//!
//! Handles video selection and local preview, reads the playback
//! position, and provides the stage controls, frame viewers, quadrant
//! overlay, and status line used by the kicklens web application.

pub mod components;
pub mod media;
pub mod playback;

pub use components::{
    FrameViewer, QuadrantOverlay, StageControls, StatusBanner, VideoPlayer, VideoUpload,
};
pub use media::MediaError;
