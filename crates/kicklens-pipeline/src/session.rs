//! Async driver tying the controller to a remote collaborator.

use std::cell::RefCell;

use crate::controller::{Command, Commit, PipelineController};
use crate::types::PipelineError;
use crate::wire::{
    DetectRequest, DetectResponse, ExtractRequest, ExtractResponse, PredictRequest,
    PredictResponse, Request, Response, UploadRequest, UploadResponse,
};

/// The four remote services the pipeline talks to.
///
/// Implementations perform exactly one request per call and never retry.
/// Futures are not required to be `Send`: the pipeline is single-threaded
/// and event-driven, and browser fetch futures are `!Send`.
#[allow(async_fn_in_trait)]
pub trait Collaborator {
    /// Store the source video and return its assigned filename.
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, PipelineError>;

    /// Extract frames around a timestamp.
    async fn extract_frames(
        &self,
        request: &ExtractRequest,
    ) -> Result<ExtractResponse, PipelineError>;

    /// Annotate the extracted frames with pose markers.
    async fn detect_pose(&self, request: &DetectRequest) -> Result<DetectResponse, PipelineError>;

    /// Predict quadrant probabilities from the annotated frames.
    async fn predict_direction(
        &self,
        request: &PredictRequest,
    ) -> Result<PredictResponse, PipelineError>;

    /// Route `request` to the matching method.
    async fn dispatch(&self, request: &Request) -> Result<Response, PipelineError> {
        Ok(match request {
            Request::Upload(r) => Response::Upload(self.upload(r).await?),
            Request::Extract(r) => Response::Extract(self.extract_frames(r).await?),
            Request::Detect(r) => Response::Detect(self.detect_pose(r).await?),
            Request::Predict(r) => Response::Predict(self.predict_direction(r).await?),
        })
    }
}

/// Run one command end to end.
///
/// The controller is borrowed only for the synchronous
/// [`begin`](PipelineController::begin) and
/// [`complete`](PipelineController::complete) steps, never across the
/// collaborator await, so other commands may be attempted (and rejected
/// as busy, or supersede this one) while it is in flight.
///
/// # Errors
///
/// Any error from [`PipelineController::begin`] (no call is issued), or
/// from the collaborator and [`PipelineController::complete`].
pub async fn run<C: Collaborator>(
    controller: &RefCell<PipelineController>,
    collaborator: &C,
    command: Command,
) -> Result<Commit, PipelineError> {
    let ticket = controller.borrow_mut().begin(command)?;
    let result = collaborator.dispatch(ticket.request()).await;
    controller.borrow_mut().complete(ticket, result)
}
