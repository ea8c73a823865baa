//! Status and body handling shared by every endpoint.

use kicklens_pipeline::wire::{self, error_detail};
use kicklens_pipeline::{Action, PipelineError};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Longest raw body excerpt carried into an error message.
const MAX_DETAIL: usize = 200;

/// Turn a non-success status into [`PipelineError::RemoteActionFailed`].
///
/// The detail prefers the collaborator's `{"error": ...}` field, then
/// the raw body, then the status reason phrase.
pub async fn check_response(
    action: Action,
    resp: reqwest::Response,
) -> Result<reqwest::Response, PipelineError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_else(|e| {
        debug!(%action, status = status.as_u16(), error = %e, "failed to read error body");
        Default::default()
    });
    let detail = error_detail(&body)
        .or_else(|| {
            let text = String::from_utf8_lossy(&body);
            let text = text.trim();
            (!text.is_empty()).then(|| text.chars().take(MAX_DETAIL).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_owned());
    Err(PipelineError::RemoteActionFailed {
        action,
        reason: format!("HTTP {}: {detail}", status.as_u16()),
    })
}

/// Read and decode a successful response body.
pub async fn decode_body<T: DeserializeOwned>(
    action: Action,
    resp: reqwest::Response,
) -> Result<T, PipelineError> {
    let body = resp.bytes().await.map_err(|e| transport(action, &e))?;
    wire::decode(action, &body)
}

/// Map a transport-level failure.
pub fn transport(action: Action, err: &reqwest::Error) -> PipelineError {
    PipelineError::RemoteActionFailed {
        action,
        reason: err.to_string(),
    }
}
