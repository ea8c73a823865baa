//! kicklens-pipeline: staged kick-analysis controller (sans-IO).
//!
//! Tracks a single analysis session through
//! upload -> frame extraction -> pose detection -> direction prediction,
//! deciding which derived artifacts are currently valid and turning the
//! predicted quadrant probabilities into bounded display intensities.
//!
//! This crate has **no I/O dependencies** -- remote services are reached
//! through the [`Collaborator`] trait, and every state change flows
//! through [`PipelineController`]. All browser and HTTP interaction lives
//! in `kicklens-io` and `kicklens-remote`.

pub mod controller;
pub mod gate;
pub mod navigator;
pub mod quadrant;
pub mod session;
pub mod store;
pub mod types;
pub mod wire;

pub use controller::{Command, Commit, PipelineController, Status, StatusKind, Ticket};
pub use gate::StageGate;
pub use navigator::{Cursor, FrameNavigator};
pub use quadrant::{
    CellRect, Quadrant, QuadrantCell, QuadrantGrid, QuadrantVisualizer, VisualizerConfig,
};
pub use session::{Collaborator, run};
pub use store::ArtifactStore;
pub use types::{
    Action, Artifact, ArtifactSequence, Epoch, MissingArtifact, PipelineError, PipelineStage,
    ProbabilityVector, SequenceKind, SourceFile,
};
pub use wire::{
    DetectRequest, DetectResponse, ExtractRequest, ExtractResponse, PredictRequest,
    PredictResponse, RecordId, Request, Response, UploadRequest, UploadResponse,
};
