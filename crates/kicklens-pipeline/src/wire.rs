//! Request and response shapes exchanged with the remote collaborators.
//!
//! Responses are decoded into typed values at the boundary. Anything
//! that does not match the expected shape becomes
//! [`PipelineError::MalformedResponse`] before it can reach the store.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{Action, PipelineError, SourceFile};

/// Upload request: the selected video, sent as multipart field `file`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: SourceFile,
}

/// Multipart form field carrying the uploaded video.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub filename: String,
    /// Playback position in seconds.
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectRequest {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub filename: String,
}

/// Database identifier assigned by a collaborator.
///
/// Collaborators send integer row ids; string ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Name under which the collaborator stored the video.
    pub filename: String,
    #[serde(default)]
    pub video_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub frame_urls: Vec<String>,
    #[serde(default)]
    pub kick_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub annotated_frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Raw values; length and range are checked when committed.
    pub quadrant_probs: Vec<f64>,
}

/// A request for one pipeline action.
#[derive(Debug, Clone)]
pub enum Request {
    Upload(UploadRequest),
    Extract(ExtractRequest),
    Detect(DetectRequest),
    Predict(PredictRequest),
}

impl Request {
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Upload(_) => Action::Upload,
            Self::Extract(_) => Action::Extract,
            Self::Detect(_) => Action::Detect,
            Self::Predict(_) => Action::Predict,
        }
    }
}

/// A decoded response for one pipeline action.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Upload(UploadResponse),
    Extract(ExtractResponse),
    Detect(DetectResponse),
    Predict(PredictResponse),
}

impl Response {
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Upload(_) => Action::Upload,
            Self::Extract(_) => Action::Extract,
            Self::Detect(_) => Action::Detect,
            Self::Predict(_) => Action::Predict,
        }
    }

    /// The collaborator's human-readable message, if it sent one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Upload(_) => None,
            Self::Extract(r) => r.message.as_deref(),
            Self::Detect(r) => r.message.as_deref(),
            Self::Predict(r) => r.message.as_deref(),
        }
    }

    /// Decode a JSON body for `action`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedResponse`] if the body does not
    /// match the response shape for `action`.
    pub fn decode(action: Action, body: &[u8]) -> Result<Self, PipelineError> {
        Ok(match action {
            Action::Upload => Self::Upload(decode(action, body)?),
            Action::Extract => Self::Extract(decode(action, body)?),
            Action::Detect => Self::Detect(decode(action, body)?),
            Action::Predict => Self::Predict(decode(action, body)?),
        })
    }
}

/// Decode a JSON body into `T`, attributing failures to `action`.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedResponse`] on any parse or shape
/// error.
pub fn decode<T: DeserializeOwned>(action: Action, body: &[u8]) -> Result<T, PipelineError> {
    serde_json::from_slice(body).map_err(|e| PipelineError::MalformedResponse {
        action,
        reason: e.to_string(),
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Extract the `error` field from a collaborator error body, if present.
#[must_use]
pub fn error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
}
