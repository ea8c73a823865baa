//! The staged-pipeline state machine.
//!
//! [`PipelineController`] owns every piece of mutable session state. An
//! action runs in two synchronous halves around one remote call:
//!
//! 1. [`begin`](PipelineController::begin) checks the busy guard and the
//!    stage gate, then hands back a [`Ticket`] carrying the request.
//! 2. The caller performs the remote call however it likes.
//! 3. [`complete`](PipelineController::complete) validates the response
//!    and commits it, or discards it if the ticket was superseded.
//!
//! Keeping both halves synchronous means no borrow of the controller is
//! ever held across the network await. See [`crate::session::run`] for
//! the async glue.

use tracing::{debug, info, warn};

use crate::gate::StageGate;
use crate::navigator::FrameNavigator;
use crate::store::ArtifactStore;
use crate::types::{
    Action, ArtifactSequence, Epoch, MissingArtifact, PipelineError, PipelineStage,
    ProbabilityVector, SequenceKind, SourceFile,
};
use crate::wire::{
    DetectRequest, ExtractRequest, PredictRequest, RecordId, Request, Response, UploadRequest,
};

/// A user-initiated pipeline action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Upload the selected source file.
    Upload,
    /// Extract frames around `timestamp` seconds into the video.
    ExtractFrames { timestamp: f64 },
    /// Annotate the extracted frames.
    DetectPose,
    /// Predict the kick direction.
    PredictDirection,
}

impl Command {
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Upload => Action::Upload,
            Self::ExtractFrames { .. } => Action::Extract,
            Self::DetectPose => Action::Detect,
            Self::PredictDirection => Action::Predict,
        }
    }
}

/// Proof that an action was accepted, carrying the request to dispatch.
///
/// Must be handed back to [`PipelineController::complete`] with the
/// collaborator's result.
#[derive(Debug, Clone)]
#[must_use = "a ticket must be completed, or the session stays busy"]
pub struct Ticket {
    id: u64,
    epoch: Epoch,
    request: Request,
}

impl Ticket {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The store epoch at dispatch time.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub const fn action(&self) -> Action {
        self.request.action()
    }

    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }
}

/// What [`PipelineController::complete`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The response was committed; the session is now at this stage.
    Applied(PipelineStage),
    /// The ticket had been superseded; nothing changed.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

/// Human-readable status line for the most recent action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    fn pending(action: Action) -> Self {
        Self {
            kind: StatusKind::Pending,
            message: action.pending_status().to_owned(),
        }
    }

    fn success(message: String) -> Self {
        Self {
            kind: StatusKind::Success,
            message,
        }
    }

    fn error(err: &PipelineError) -> Self {
        Self {
            kind: StatusKind::Error,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    id: u64,
    action: Action,
}

/// Single owner of all session state.
#[derive(Debug, Clone, Default)]
pub struct PipelineController {
    store: ArtifactStore,
    stage: PipelineStage,
    source: Option<SourceFile>,
    probabilities: Option<ProbabilityVector>,
    frames: FrameNavigator,
    annotated: FrameNavigator,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    status: Option<Status>,
    video_id: Option<RecordId>,
    kick_id: Option<RecordId>,
}

impl PipelineController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's file selection.
    ///
    /// Nothing is sent until [`Command::Upload`] runs; committed
    /// artifacts from a previous upload stay valid until then.
    pub fn select_file(&mut self, file: SourceFile) {
        info!(name = file.name(), bytes = file.len(), "source file selected");
        self.source = Some(file);
    }

    /// Accept `command` and produce the request to dispatch.
    ///
    /// An upload supersedes any other in-flight action: the earlier
    /// ticket's response will be discarded when it arrives.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::PipelineBusy`] if another action is in flight
    ///   and this one cannot supersede it.
    /// - [`PipelineError::PreconditionNotMet`] if the stage gate denies
    ///   the action.
    /// - [`PipelineError::InvalidTimestamp`] for a negative or non-finite
    ///   extraction timestamp.
    pub fn begin(&mut self, command: Command) -> Result<Ticket, PipelineError> {
        let action = command.action();

        if let Some(pending) = self.in_flight {
            let supersedes = action == Action::Upload && pending.action != Action::Upload;
            if !supersedes {
                warn!(requested = %action, pending = %pending.action, "rejected: pipeline busy");
                return Err(PipelineError::PipelineBusy {
                    requested: action,
                    pending: pending.action,
                });
            }
        }

        let request = self.build_request(command).inspect_err(|e| {
            warn!(action = %action, error = %e, "rejected");
            self.status = Some(Status::error(e));
        })?;

        if let Some(pending) = self.in_flight {
            info!(ticket = pending.id, pending = %pending.action, "superseded by upload");
        }

        let id = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.in_flight = Some(InFlight { id, action });
        self.status = Some(Status::pending(action));

        let epoch = self.store.epoch();
        debug!(ticket = id, action = %action, epoch = %epoch, "dispatching");
        Ok(Ticket { id, epoch, request })
    }

    /// Apply the collaborator's result for `ticket`.
    ///
    /// Returns [`Commit::Discarded`] without touching any state when the
    /// ticket is no longer the in-flight one or the store has moved to a
    /// different epoch since dispatch.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error, or
    /// [`PipelineError::MalformedResponse`] if the response cannot be
    /// committed. In both cases the session stays at its last committed
    /// stage and the busy guard is released.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Response, PipelineError>,
    ) -> Result<Commit, PipelineError> {
        let action = ticket.action();
        let current = self.in_flight.is_some_and(|f| f.id == ticket.id);
        if !current || ticket.epoch != self.store.epoch() {
            if current {
                self.in_flight = None;
            }
            debug!(
                ticket = ticket.id,
                action = %action,
                dispatched = %ticket.epoch,
                current = %self.store.epoch(),
                "discarding stale response"
            );
            return Ok(Commit::Discarded);
        }
        self.in_flight = None;

        match result.and_then(|response| self.apply(action, response)) {
            Ok(message) => {
                info!(
                    action = %action,
                    stage = %self.stage,
                    epoch = %self.store.epoch(),
                    "committed"
                );
                self.status = Some(Status::success(message));
                Ok(Commit::Applied(self.stage))
            }
            Err(e) => {
                warn!(action = %action, error = %e, "action failed");
                self.status = Some(Status::error(&e));
                Err(e)
            }
        }
    }

    fn build_request(&self, command: Command) -> Result<Request, PipelineError> {
        let action = command.action();
        self.gate().check(action)?;
        Ok(match command {
            Command::Upload => {
                let file = self.source.clone().ok_or(PipelineError::PreconditionNotMet {
                    action,
                    missing: MissingArtifact::SourceFile,
                })?;
                Request::Upload(UploadRequest { file })
            }
            Command::ExtractFrames { timestamp } => {
                if !timestamp.is_finite() || timestamp < 0.0 {
                    return Err(PipelineError::InvalidTimestamp(timestamp));
                }
                Request::Extract(ExtractRequest {
                    filename: self.require_filename(action)?,
                    timestamp,
                })
            }
            Command::DetectPose => Request::Detect(DetectRequest {
                filename: self.require_filename(action)?,
            }),
            Command::PredictDirection => Request::Predict(PredictRequest {
                filename: self.require_filename(action)?,
            }),
        })
    }

    fn require_filename(&self, action: Action) -> Result<String, PipelineError> {
        self.store
            .stored_filename()
            .map(str::to_owned)
            .ok_or(PipelineError::PreconditionNotMet {
                action,
                missing: MissingArtifact::StoredFilename,
            })
    }

    /// Validate then commit. Returns the success status text.
    ///
    /// Every fallible check happens before the first mutation.
    fn apply(&mut self, action: Action, response: Response) -> Result<String, PipelineError> {
        let message = response.message().map(str::to_owned);
        match (action, response) {
            (Action::Upload, Response::Upload(r)) => {
                if r.filename.trim().is_empty() {
                    return Err(PipelineError::MalformedResponse {
                        action,
                        reason: "empty filename".into(),
                    });
                }
                let text = format!("Upload succeeded: {}", r.filename);
                self.store.reset(r.filename);
                self.video_id = r.video_id;
                self.kick_id = None;
                self.cascade(action);
                self.stage = action.completed_stage();
                Ok(text)
            }
            (Action::Extract, Response::Extract(r)) => {
                let count = r.frame_urls.len();
                self.store.replace(SequenceKind::Frames, r.frame_urls);
                self.kick_id = r.kick_id;
                self.cascade(action);
                self.stage = action.completed_stage();
                Ok(message.unwrap_or_else(|| format!("Extracted {count} frames")))
            }
            (Action::Detect, Response::Detect(r)) => {
                let count = r.annotated_frames.len();
                self.store
                    .replace(SequenceKind::AnnotatedFrames, r.annotated_frames);
                self.cascade(action);
                self.stage = action.completed_stage();
                Ok(message.unwrap_or_else(|| format!("Annotated {count} frames")))
            }
            (Action::Predict, Response::Predict(r)) => {
                let probs = ProbabilityVector::try_from(r.quadrant_probs)?;
                self.probabilities = Some(probs);
                self.stage = action.completed_stage();
                Ok(message.unwrap_or_else(|| "Prediction complete".to_owned()))
            }
            (action, other) => Err(PipelineError::MalformedResponse {
                action,
                reason: format!("received a {} response", other.action()),
            }),
        }
    }

    /// Clear everything strictly downstream of `action` and rebind any
    /// navigator whose sequence changed.
    fn cascade(&mut self, action: Action) {
        for downstream in action.downstream() {
            if let Some(kind) = SequenceKind::produced_by(downstream) {
                self.store.invalidate(kind);
            }
            if downstream == Action::Predict {
                self.probabilities = None;
            }
            debug!(from = %action, cleared = %downstream, "cascade");
        }
        for kind in SequenceKind::ALL {
            let current = self.store.get(kind);
            let navigator = match kind {
                SequenceKind::Frames => &mut self.frames,
                SequenceKind::AnnotatedFrames => &mut self.annotated,
            };
            if !std::sync::Arc::ptr_eq(navigator.sequence(), current) {
                navigator.bind(std::sync::Arc::clone(current));
            }
        }
    }

    /// Gate view over the current state.
    #[must_use]
    pub fn gate(&self) -> StageGate<'_> {
        StageGate::new(&self.store, self.source.as_ref())
    }

    /// Whether `action` could be started right now: its gate passes and
    /// the busy guard would let it through.
    #[must_use]
    pub fn can(&self, action: Action) -> bool {
        let free = self.in_flight.is_none_or(|pending| {
            action == Action::Upload && pending.action != Action::Upload
        });
        free && self.gate().allows(action)
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The action currently in flight, if any.
    #[must_use]
    pub fn pending_action(&self) -> Option<Action> {
        self.in_flight.map(|f| f.action)
    }

    #[must_use]
    pub const fn stage(&self) -> PipelineStage {
        self.stage
    }

    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.store.epoch()
    }

    #[must_use]
    pub fn stored_filename(&self) -> Option<&str> {
        self.store.stored_filename()
    }

    #[must_use]
    pub const fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn sequence(&self, kind: SequenceKind) -> &ArtifactSequence {
        self.store.get(kind)
    }

    #[must_use]
    pub const fn probabilities(&self) -> Option<&ProbabilityVector> {
        self.probabilities.as_ref()
    }

    #[must_use]
    pub const fn navigator(&self, kind: SequenceKind) -> &FrameNavigator {
        match kind {
            SequenceKind::Frames => &self.frames,
            SequenceKind::AnnotatedFrames => &self.annotated,
        }
    }

    /// Mutable navigator access for cursor movement. Navigators cannot
    /// modify artifacts, so this does not bypass the controller.
    pub const fn navigator_mut(&mut self, kind: SequenceKind) -> &mut FrameNavigator {
        match kind {
            SequenceKind::Frames => &mut self.frames,
            SequenceKind::AnnotatedFrames => &mut self.annotated,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Identifier the upload collaborator assigned, if it sent one.
    #[must_use]
    pub const fn video_id(&self) -> Option<&RecordId> {
        self.video_id.as_ref()
    }

    /// Identifier of the current frame extraction, if it sent one.
    #[must_use]
    pub const fn kick_id(&self) -> Option<&RecordId> {
        self.kick_id.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::wire::{DetectResponse, ExtractResponse, PredictResponse, UploadResponse};

    fn upload_ok(name: &str) -> Response {
        Response::Upload(UploadResponse {
            filename: name.into(),
            video_id: Some(RecordId::Number(1)),
        })
    }

    fn extract_ok(n: usize) -> Response {
        Response::Extract(ExtractResponse {
            message: Some("Frames extracted".into()),
            frame_urls: (0..n).map(|i| format!("/api/temp_frames/f{i}.png")).collect(),
            kick_id: Some(RecordId::Number(7)),
        })
    }

    fn detect_ok(n: usize) -> Response {
        Response::Detect(DetectResponse {
            message: None,
            annotated_frames: (0..n).map(|i| format!("/api/annotated/a{i}.png")).collect(),
        })
    }

    fn predict_ok(values: Vec<f64>) -> Response {
        Response::Predict(PredictResponse {
            message: Some("Prediction complete".into()),
            quadrant_probs: values,
        })
    }

    fn run(
        c: &mut PipelineController,
        command: Command,
        response: Response,
    ) -> Result<Commit, PipelineError> {
        let ticket = c.begin(command)?;
        c.complete(ticket, Ok(response))
    }

    fn predicted() -> PipelineController {
        let mut c = PipelineController::new();
        c.select_file(SourceFile::new("kick.mp4", vec![1_u8, 2, 3]));
        run(&mut c, Command::Upload, upload_ok("kick.mp4")).unwrap();
        run(&mut c, Command::ExtractFrames { timestamp: 1.5 }, extract_ok(21)).unwrap();
        run(&mut c, Command::DetectPose, detect_ok(21)).unwrap();
        run(&mut c, Command::PredictDirection, predict_ok(vec![0.1; 6])).unwrap();
        c
    }

    #[test]
    fn full_forward_run_reaches_prediction() {
        let c = predicted();
        assert_eq!(c.stage(), PipelineStage::DirectionPredicted);
        assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
        assert_eq!(c.sequence(SequenceKind::AnnotatedFrames).len(), 21);
        assert!(c.probabilities().is_some());
        assert_eq!(c.video_id(), Some(&RecordId::Number(1)));
        assert_eq!(c.kick_id(), Some(&RecordId::Number(7)));
        assert!(!c.is_busy());
    }

    #[test]
    fn upload_without_selection_is_refused() {
        let mut c = PipelineController::new();
        let err = c.begin(Command::Upload).unwrap_err();
        assert_eq!(
            err,
            PipelineError::PreconditionNotMet {
                action: Action::Upload,
                missing: MissingArtifact::SourceFile,
            }
        );
        assert!(!c.is_busy());
        assert_eq!(c.status().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn upload_resets_everything() {
        let mut c = predicted();
        let before = c.epoch();
        run(&mut c, Command::Upload, upload_ok("again.mp4")).unwrap();
        assert_eq!(c.stage(), PipelineStage::Uploaded);
        assert!(c.epoch() > before);
        assert_eq!(c.stored_filename(), Some("again.mp4"));
        assert!(c.sequence(SequenceKind::Frames).is_empty());
        assert!(c.sequence(SequenceKind::AnnotatedFrames).is_empty());
        assert!(c.probabilities().is_none());
        assert!(c.navigator(SequenceKind::Frames).is_empty());
        assert_eq!(c.status().unwrap().message, "Upload succeeded: again.mp4");
    }

    #[test]
    fn re_extract_clears_downstream() {
        let mut c = predicted();
        c.navigator_mut(SequenceKind::Frames).select(10);
        run(&mut c, Command::ExtractFrames { timestamp: 3.0 }, extract_ok(5)).unwrap();
        assert_eq!(c.stage(), PipelineStage::FramesExtracted);
        assert_eq!(c.sequence(SequenceKind::Frames).len(), 5);
        assert!(c.sequence(SequenceKind::AnnotatedFrames).is_empty());
        assert!(c.probabilities().is_none());
        assert_eq!(c.navigator(SequenceKind::Frames).cursor().index(), 0);
        assert_eq!(c.navigator(SequenceKind::Frames).cursor().length(), 5);
        assert!(c.navigator(SequenceKind::AnnotatedFrames).is_empty());
    }

    #[test]
    fn re_detect_clears_prediction_but_keeps_frames() {
        let mut c = predicted();
        run(&mut c, Command::DetectPose, detect_ok(3)).unwrap();
        assert_eq!(c.stage(), PipelineStage::PoseDetected);
        assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
        assert!(c.probabilities().is_none());
        assert_eq!(c.status().unwrap().message, "Annotated 3 frames");
    }

    #[test]
    fn predict_does_not_move_epoch_or_navigators() {
        let mut c = predicted();
        c.navigator_mut(SequenceKind::AnnotatedFrames).select(7);
        let epoch = c.epoch();
        run(&mut c, Command::PredictDirection, predict_ok(vec![1.0; 6])).unwrap();
        assert_eq!(c.epoch(), epoch);
        assert_eq!(
            c.navigator(SequenceKind::AnnotatedFrames).cursor().index(),
            7
        );
    }

    #[test]
    fn empty_extraction_bumps_epoch_and_closes_detect() {
        let mut c = predicted();
        let epoch = c.epoch();
        run(&mut c, Command::ExtractFrames { timestamp: 0.0 }, extract_ok(0)).unwrap();
        assert!(c.epoch() > epoch);
        assert!(!c.can(Action::Detect));
    }

    #[test]
    fn wrong_length_prediction_commits_nothing() {
        let mut c = predicted();
        run(&mut c, Command::DetectPose, detect_ok(2)).unwrap();
        let err = run(&mut c, Command::PredictDirection, predict_ok(vec![0.5; 5])).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse { .. }));
        assert_eq!(c.stage(), PipelineStage::PoseDetected);
        assert!(c.probabilities().is_none());
        assert!(!c.is_busy());
    }

    #[test]
    fn remote_failure_keeps_committed_state() {
        let mut c = predicted();
        let epoch = c.epoch();
        let ticket = c.begin(Command::ExtractFrames { timestamp: 2.0 }).unwrap();
        let err = c
            .complete(
                ticket,
                Err(PipelineError::RemoteActionFailed {
                    action: Action::Extract,
                    reason: "HTTP 500".into(),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::RemoteActionFailed { .. }));
        assert_eq!(c.stage(), PipelineStage::DirectionPredicted);
        assert_eq!(c.epoch(), epoch);
        assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
        assert_eq!(c.status().unwrap().message, "extract frames failed: HTTP 500");
    }

    #[test]
    fn mismatched_response_is_malformed() {
        let mut c = predicted();
        let err = run(&mut c, Command::DetectPose, extract_ok(2)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedResponse {
                action: Action::Detect,
                ..
            }
        ));
        assert_eq!(c.sequence(SequenceKind::AnnotatedFrames).len(), 21);
    }

    #[test]
    fn second_action_while_pending_is_busy() {
        let mut c = predicted();
        let ticket = c.begin(Command::ExtractFrames { timestamp: 1.0 }).unwrap();
        let err = c.begin(Command::ExtractFrames { timestamp: 2.0 }).unwrap_err();
        assert_eq!(
            err,
            PipelineError::PipelineBusy {
                requested: Action::Extract,
                pending: Action::Extract,
            }
        );
        assert!(!c.can(Action::Detect));
        assert!(c.can(Action::Upload));
        assert_eq!(
            c.complete(ticket, Ok(extract_ok(4))).unwrap(),
            Commit::Applied(PipelineStage::FramesExtracted)
        );
    }

    #[test]
    fn upload_while_uploading_is_busy() {
        let mut c = PipelineController::new();
        c.select_file(SourceFile::new("kick.mp4", vec![0_u8]));
        let _ticket = c.begin(Command::Upload).unwrap();
        assert!(matches!(
            c.begin(Command::Upload),
            Err(PipelineError::PipelineBusy { .. })
        ));
    }

    #[test]
    fn superseded_response_is_discarded() {
        let mut c = predicted();
        let stale = c.begin(Command::ExtractFrames { timestamp: 1.0 }).unwrap();
        let upload = c.begin(Command::Upload).unwrap();
        assert_eq!(c.pending_action(), Some(Action::Upload));

        assert_eq!(c.complete(stale, Ok(extract_ok(9))).unwrap(), Commit::Discarded);
        assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
        assert!(c.is_busy());

        c.complete(upload, Ok(upload_ok("new.mp4"))).unwrap();
        assert_eq!(c.stage(), PipelineStage::Uploaded);
        assert!(c.sequence(SequenceKind::Frames).is_empty());
    }

    #[test]
    fn stale_error_is_discarded_silently() {
        let mut c = predicted();
        let stale = c.begin(Command::DetectPose).unwrap();
        let _upload = c.begin(Command::Upload).unwrap();
        let result = c.complete(
            stale,
            Err(PipelineError::RemoteActionFailed {
                action: Action::Detect,
                reason: "timeout".into(),
            }),
        );
        assert_eq!(result.unwrap(), Commit::Discarded);
        assert_eq!(c.status().unwrap().kind, StatusKind::Pending);
    }

    #[test]
    fn invalid_timestamps_are_rejected() {
        let mut c = predicted();
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                c.begin(Command::ExtractFrames { timestamp: bad }),
                Err(PipelineError::InvalidTimestamp(_))
            ));
        }
        assert!(!c.is_busy());
    }

    #[test]
    fn pending_status_is_shown_while_in_flight() {
        let mut c = predicted();
        let _ticket = c.begin(Command::PredictDirection).unwrap();
        let status = c.status().unwrap();
        assert_eq!(status.kind, StatusKind::Pending);
        assert_eq!(status.message, "Predicting kick direction...");
    }
}
