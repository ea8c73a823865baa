//! Collaborator addressing.

use kicklens_pipeline::Action;
use serde::{Deserialize, Serialize};

/// Where each pipeline action is served.
///
/// Paths are joined onto `base_url`; returned artifact paths are
/// resolved against the same base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub upload_path: String,
    pub extract_path: String,
    pub detect_path: String,
    pub predict_path: String,
}

impl RemoteConfig {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8098";
    pub const DEFAULT_UPLOAD_PATH: &str = "/api/upload";
    pub const DEFAULT_EXTRACT_PATH: &str = "/api/extract_frames";
    pub const DEFAULT_DETECT_PATH: &str = "/api/detect_pose";
    pub const DEFAULT_PREDICT_PATH: &str = "/api/predict_kick";

    /// Default paths against a different base address.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// The path configured for `action`.
    #[must_use]
    pub fn path(&self, action: Action) -> &str {
        match action {
            Action::Upload => &self.upload_path,
            Action::Extract => &self.extract_path,
            Action::Detect => &self.detect_path,
            Action::Predict => &self.predict_path,
        }
    }

    /// Absolute URL for `action`.
    #[must_use]
    pub fn endpoint(&self, action: Action) -> String {
        join(&self.base_url, self.path(action))
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            upload_path: Self::DEFAULT_UPLOAD_PATH.to_owned(),
            extract_path: Self::DEFAULT_EXTRACT_PATH.to_owned(),
            detect_path: Self::DEFAULT_DETECT_PATH.to_owned(),
            predict_path: Self::DEFAULT_PREDICT_PATH.to_owned(),
        }
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let config = RemoteConfig::default();
        assert_eq!(
            config.endpoint(Action::Upload),
            "http://localhost:8098/api/upload"
        );
        assert_eq!(
            config.endpoint(Action::Predict),
            "http://localhost:8098/api/predict_kick"
        );
    }

    #[test]
    fn trailing_and_leading_slashes_collapse() {
        let mut config = RemoteConfig::with_base_url("http://example.test:9000/");
        config.detect_path = "pose".into();
        assert_eq!(
            config.endpoint(Action::Detect),
            "http://example.test:9000/pose"
        );
        assert_eq!(
            config.endpoint(Action::Extract),
            "http://example.test:9000/api/extract_frames"
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RemoteConfig =
            serde_json::from_str(r#"{"base_url": "http://10.0.0.2:8098"}"#).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:8098");
        assert_eq!(config.upload_path, RemoteConfig::DEFAULT_UPLOAD_PATH);
    }
}
