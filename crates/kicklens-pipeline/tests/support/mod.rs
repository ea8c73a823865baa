//! Scripted collaborator shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use futures::channel::oneshot;
use kicklens_pipeline::{
    Action, Collaborator, DetectRequest, DetectResponse, ExtractRequest, ExtractResponse,
    PipelineError, PredictRequest, PredictResponse, RecordId, UploadRequest, UploadResponse,
};

/// Counts calls per action and answers with canned responses.
///
/// Each extraction returns `frames` frame paths named after the call
/// number, so tests can tell one extraction's output from another's.
/// An extraction can be parked on a oneshot channel with
/// [`hold_next_extract`](Self::hold_next_extract).
pub struct StubCollaborator {
    pub frames: usize,
    pub probs: Vec<f64>,
    pub fail: Option<Action>,
    calls: [Cell<usize>; 4],
    extract_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl StubCollaborator {
    pub fn new() -> Self {
        Self {
            frames: 21,
            probs: vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.5],
            fail: None,
            calls: Default::default(),
            extract_gate: RefCell::new(None),
        }
    }

    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_probs(mut self, probs: Vec<f64>) -> Self {
        self.probs = probs;
        self
    }

    pub fn failing(mut self, action: Action) -> Self {
        self.fail = Some(action);
        self
    }

    /// Park the next extraction until the returned sender fires.
    pub fn hold_next_extract(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.extract_gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn calls(&self, action: Action) -> usize {
        self.calls[action as usize].get()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(Cell::get).sum()
    }

    fn record(&self, action: Action) -> Result<usize, PipelineError> {
        let counter = &self.calls[action as usize];
        let n = counter.get() + 1;
        counter.set(n);
        if self.fail == Some(action) {
            return Err(PipelineError::RemoteActionFailed {
                action,
                reason: "HTTP 500 Internal Server Error: stub failure".into(),
            });
        }
        Ok(n)
    }
}

impl Collaborator for StubCollaborator {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, PipelineError> {
        self.record(Action::Upload)?;
        Ok(UploadResponse {
            filename: request.file.name().to_owned(),
            video_id: Some(RecordId::Number(1)),
        })
    }

    async fn extract_frames(
        &self,
        request: &ExtractRequest,
    ) -> Result<ExtractResponse, PipelineError> {
        let gate = self.extract_gate.borrow_mut().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        let n = self.record(Action::Extract)?;
        Ok(ExtractResponse {
            message: Some(format!("Frames extracted at {}s", request.timestamp)),
            frame_urls: (0..self.frames)
                .map(|i| format!("/api/temp_frames/call{n}/frame_{i:03}.png"))
                .collect(),
            kick_id: Some(RecordId::Number(n as u64)),
        })
    }

    async fn detect_pose(&self, _request: &DetectRequest) -> Result<DetectResponse, PipelineError> {
        let n = self.record(Action::Detect)?;
        Ok(DetectResponse {
            message: Some("Pose detection complete".into()),
            annotated_frames: (0..self.frames)
                .map(|i| format!("/api/annotated/call{n}/frame_{i:03}.png"))
                .collect(),
        })
    }

    async fn predict_direction(
        &self,
        _request: &PredictRequest,
    ) -> Result<PredictResponse, PipelineError> {
        self.record(Action::Predict)?;
        Ok(PredictResponse {
            message: Some("Prediction complete".into()),
            quadrant_probs: self.probs.clone(),
        })
    }
}
