//! kicklens-remote: HTTP access to the upload, frame-extraction,
//! pose-detection and prediction services.
//!
//! [`HttpCollaborator`] implements [`kicklens_pipeline::Collaborator`] on
//! top of `reqwest`, so the same code drives the browser app (`wasm32`,
//! backed by `fetch`) and the native command-line client.

mod client;
mod config;
mod response;

pub use client::HttpCollaborator;
pub use config::RemoteConfig;
