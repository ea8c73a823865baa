//! `reqwest`-backed [`Collaborator`].

use kicklens_pipeline::wire::{
    DetectRequest, DetectResponse, ExtractRequest, ExtractResponse, PredictRequest,
    PredictResponse, UPLOAD_FIELD, UploadRequest, UploadResponse,
};
use kicklens_pipeline::{Action, Collaborator, PipelineError};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::response::{check_response, decode_body, transport};

/// Talks to the collaborator services over HTTP.
///
/// Session cookies set by the collaborator are kept and replayed: via
/// the client's cookie store natively, via `credentials: include` in the
/// browser.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl HttpCollaborator {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the HTTP client cannot
    /// be constructed.
    pub fn new(config: RemoteConfig) -> Result<Self, PipelineError> {
        let http = build_client()
            .map_err(|e| PipelineError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn post(&self, action: Action) -> reqwest::RequestBuilder {
        let url = self.config.endpoint(action);
        debug!(action = %action, url = %url, "POST");
        let builder = self.http.post(url);
        #[cfg(target_arch = "wasm32")]
        let builder = builder.fetch_credentials_include();
        builder
    }

    async fn send<T: DeserializeOwned>(
        &self,
        action: Action,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, PipelineError> {
        let resp = builder.send().await.map_err(|e| transport(action, &e))?;
        let resp = check_response(action, resp).await?;
        decode_body(action, resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        action: Action,
        body: &B,
    ) -> Result<T, PipelineError> {
        self.send(action, self.post(action).json(body)).await
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().cookie_store(true).build()
}

#[cfg(target_arch = "wasm32")]
fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().build()
}

impl Collaborator for HttpCollaborator {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, PipelineError> {
        let file = &request.file;
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_owned())
            .mime_str(file.mime_type())
            .map_err(|e| transport(Action::Upload, &e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);
        self.send(Action::Upload, self.post(Action::Upload).multipart(form))
            .await
    }

    async fn extract_frames(
        &self,
        request: &ExtractRequest,
    ) -> Result<ExtractResponse, PipelineError> {
        self.post_json(Action::Extract, request).await
    }

    async fn detect_pose(&self, request: &DetectRequest) -> Result<DetectResponse, PipelineError> {
        self.post_json(Action::Detect, request).await
    }

    async fn predict_direction(
        &self,
        request: &PredictRequest,
    ) -> Result<PredictResponse, PipelineError> {
        self.post_json(Action::Predict, request).await
    }
}
