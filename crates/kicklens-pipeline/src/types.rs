//! Shared types for the kicklens pipeline.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Query parameter appended to artifact URLs to defeat stale browser caches.
pub const CACHE_PARAM: &str = "v";

/// Video file extensions accepted for upload, paired with their MIME type.
pub const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
];

/// Monotonic cache-epoch token.
///
/// Bumped on every artifact-producing commit. Used to build
/// cache-busting URLs and to recognize responses that arrive after the
/// session has moved on; never used to order artifacts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Epoch(u64);

impl Epoch {
    /// The epoch of a session that has produced nothing yet.
    pub const ZERO: Self = Self(0);

    /// The raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The epoch following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four remote pipeline actions, in fixed pipeline order.
///
/// The derived ordering is the pipeline order:
/// `Upload < Extract < Detect < Predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Send the source video to the upload collaborator.
    Upload,
    /// Extract still frames around a playback timestamp.
    Extract,
    /// Annotate the extracted frames with pose markers.
    Detect,
    /// Predict the kick direction from the annotated frames.
    Predict,
}

impl Action {
    /// All actions in pipeline order.
    pub const ALL: [Self; 4] = [Self::Upload, Self::Extract, Self::Detect, Self::Predict];

    /// Lowercase verb phrase used in status and error text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Extract => "extract frames",
            Self::Detect => "detect pose",
            Self::Predict => "predict kick direction",
        }
    }

    /// Button caption for the action.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Extract => "Extract Frames at Current Time",
            Self::Detect => "Detect Pose",
            Self::Predict => "Predict Direction",
        }
    }

    /// Status text shown while the action is in flight.
    #[must_use]
    pub const fn pending_status(self) -> &'static str {
        match self {
            Self::Upload => "Uploading...",
            Self::Extract => "Extracting frames...",
            Self::Detect => "Detecting pose...",
            Self::Predict => "Predicting kick direction...",
        }
    }

    /// The pipeline stage reached when this action commits.
    #[must_use]
    pub const fn completed_stage(self) -> PipelineStage {
        match self {
            Self::Upload => PipelineStage::Uploaded,
            Self::Extract => PipelineStage::FramesExtracted,
            Self::Detect => PipelineStage::PoseDetected,
            Self::Predict => PipelineStage::DirectionPredicted,
        }
    }

    /// Actions strictly downstream of this one, in pipeline order.
    pub fn downstream(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |action| *action > self)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The most recently completed pipeline stage.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PipelineStage {
    /// No upload has completed yet.
    #[default]
    Idle,
    /// The source video is stored remotely.
    Uploaded,
    /// Frames were extracted around a timestamp.
    FramesExtracted,
    /// The extracted frames were annotated with pose markers.
    PoseDetected,
    /// A quadrant probability vector is available.
    DirectionPredicted,
}

impl PipelineStage {
    /// Human-readable stage name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Uploaded => "Uploaded",
            Self::FramesExtracted => "Frames extracted",
            Self::PoseDetected => "Pose detected",
            Self::DirectionPredicted => "Direction predicted",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one of the two artifact sequences held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Raw frames produced by [`Action::Extract`].
    Frames,
    /// Pose-annotated frames produced by [`Action::Detect`].
    AnnotatedFrames,
}

impl SequenceKind {
    /// Both sequences in pipeline order.
    pub const ALL: [Self; 2] = [Self::Frames, Self::AnnotatedFrames];

    /// The action whose commit produces this sequence.
    #[must_use]
    pub const fn producer(self) -> Action {
        match self {
            Self::Frames => Action::Extract,
            Self::AnnotatedFrames => Action::Detect,
        }
    }

    /// The sequence produced by `action`, if it produces one.
    #[must_use]
    pub const fn produced_by(action: Action) -> Option<Self> {
        match action {
            Action::Extract => Some(Self::Frames),
            Action::Detect => Some(Self::AnnotatedFrames),
            Action::Upload | Action::Predict => None,
        }
    }

    /// Display label for the sequence.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Frames => "Extracted Frames",
            Self::AnnotatedFrames => "Annotated Frames",
        }
    }
}

/// A single produced visual item: a resource path plus the epoch that
/// was current when it was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    url: String,
    epoch: Epoch,
}

impl Artifact {
    /// Create an artifact for `url` produced at `epoch`.
    #[must_use]
    pub fn new(url: impl Into<String>, epoch: Epoch) -> Self {
        Self {
            url: url.into(),
            epoch,
        }
    }

    /// The resource path as returned by the collaborator.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The epoch this artifact was committed under.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Resolve the resource path against `base` and append the
    /// cache-busting epoch parameter.
    ///
    /// Absolute URLs (containing `://`) are used as-is. Relative paths
    /// are joined to `base` with exactly one `/` between them.
    #[must_use]
    pub fn render_url(&self, base: &str) -> String {
        let resolved = if self.url.contains("://") {
            self.url.clone()
        } else {
            let base = base.trim_end_matches('/');
            let path = self.url.trim_start_matches('/');
            format!("{base}/{path}")
        };
        let separator = if resolved.contains('?') { '&' } else { '?' };
        format!("{resolved}{separator}{CACHE_PARAM}={}", self.epoch)
    }
}

/// An ordered list of artifacts for one stage.
///
/// Either empty, or non-empty with every artifact sharing the
/// sequence's own epoch. Construction goes through
/// [`from_urls`](Self::from_urls), which stamps every element with the
/// same epoch, so the invariant cannot be broken from outside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSequence {
    epoch: Epoch,
    artifacts: Vec<Artifact>,
}

impl ArtifactSequence {
    /// An empty sequence tagged with `epoch`.
    #[must_use]
    pub const fn empty(epoch: Epoch) -> Self {
        Self {
            epoch,
            artifacts: Vec::new(),
        }
    }

    /// Build a sequence from resource paths, all stamped with `epoch`.
    pub fn from_urls<I, S>(urls: I, epoch: Epoch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            epoch,
            artifacts: urls
                .into_iter()
                .map(|url| Artifact::new(url, epoch))
                .collect(),
        }
    }

    /// The epoch this sequence was produced (or cleared) under.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Number of artifacts.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns `true` if the sequence holds no artifacts.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// The artifact at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Artifact> {
        self.artifacts.get(index)
    }

    /// All artifacts in order.
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Iterate over the artifacts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }
}

impl<'a> IntoIterator for &'a ArtifactSequence {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Six non-negative quadrant probabilities in fixed order:
/// top-left, top-mid, top-right, bottom-left, bottom-mid, bottom-right.
///
/// Values are not required to sum to 1 and may be percentages; see
/// [`crate::quadrant::normalize`] for how consumers bring them onto a
/// common scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ProbabilityVector([f64; Self::LEN]);

impl ProbabilityVector {
    /// Number of quadrants.
    pub const LEN: usize = 6;

    /// Validate and wrap six raw values.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedResponse`] if any value is
    /// negative or not finite.
    pub fn new(values: [f64; Self::LEN]) -> Result<Self, PipelineError> {
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(PipelineError::MalformedResponse {
                action: Action::Predict,
                reason: format!(
                    "quadrant probability {index} is {value}, expected a finite non-negative number"
                ),
            });
        }
        Ok(Self(values))
    }

    /// The raw values in quadrant order.
    #[must_use]
    pub const fn values(&self) -> &[f64; Self::LEN] {
        &self.0
    }
}

impl TryFrom<&[f64]> for ProbabilityVector {
    type Error = PipelineError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let array: [f64; Self::LEN] =
            values
                .try_into()
                .map_err(|_| PipelineError::MalformedResponse {
                    action: Action::Predict,
                    reason: format!(
                        "expected {} quadrant probabilities, got {}",
                        Self::LEN,
                        values.len()
                    ),
                })?;
        Self::new(array)
    }
}

impl TryFrom<Vec<f64>> for ProbabilityVector {
    type Error = PipelineError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::try_from(values.as_slice())
    }
}

impl From<ProbabilityVector> for Vec<f64> {
    fn from(vector: ProbabilityVector) -> Self {
        vector.0.to_vec()
    }
}

/// The user's selected video, owned by the session.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone)]
pub struct SourceFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Wrap a selected file.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// The file name as selected by the user.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type derived from the file extension.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        video_mime_type(&self.name).unwrap_or("application/octet-stream")
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// MIME type for a video file name, or `None` if the extension is not
/// an accepted video format.
#[must_use]
pub fn video_mime_type(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    VIDEO_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Check whether a file name has an accepted video extension.
#[must_use]
pub fn is_supported_video(name: &str) -> bool {
    video_mime_type(name).is_some()
}

/// The upstream input or artifact whose absence blocks an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissingArtifact {
    /// No video file has been selected.
    SourceFile,
    /// No upload has completed, so there is no stored filename.
    StoredFilename,
    /// No extracted frames are currently valid.
    Frames,
    /// No annotated frames are currently valid.
    AnnotatedFrames,
}

impl fmt::Display for MissingArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceFile => "no video file selected",
            Self::StoredFilename => "no uploaded video",
            Self::Frames => "no extracted frames",
            Self::AnnotatedFrames => "no annotated frames",
        })
    }
}

/// Errors surfaced by a pipeline action attempt.
///
/// Every variant is recoverable: the session stays at its last committed
/// stage and may be retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// A stage gate denied the action because an upstream artifact is
    /// missing. No remote call was issued.
    #[error("cannot {action}: {missing}")]
    PreconditionNotMet {
        /// The refused action.
        action: Action,
        /// What the action is waiting for.
        missing: MissingArtifact,
    },

    /// Another action is still in flight for this session.
    #[error("cannot {requested} while {pending} is in progress")]
    PipelineBusy {
        /// The refused action.
        requested: Action,
        /// The action currently in flight.
        pending: Action,
    },

    /// The collaborator returned an error or could not be reached.
    #[error("{action} failed: {reason}")]
    RemoteActionFailed {
        /// The failed action.
        action: Action,
        /// Transport or server error detail.
        reason: String,
    },

    /// The collaborator's response is missing required fields or carries
    /// values of the wrong shape.
    #[error("malformed {action} response: {reason}")]
    MalformedResponse {
        /// The action whose response was rejected.
        action: Action,
        /// What was wrong with it.
        reason: String,
    },

    /// The extraction timestamp is negative or not finite.
    #[error("invalid timestamp {0}: must be a finite, non-negative number of seconds")]
    InvalidTimestamp(f64),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
