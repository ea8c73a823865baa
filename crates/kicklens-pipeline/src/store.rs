//! Per-session artifact storage with a monotonic cache epoch.

use std::sync::Arc;

use crate::types::{ArtifactSequence, Epoch, SequenceKind};

/// Owns every artifact sequence produced in a session, the filename
/// assigned by the upload collaborator, and the cache epoch.
///
/// Sequences are held behind [`Arc`] so that a replacement is a single
/// pointer swap: readers holding the previous sequence keep seeing it
/// whole, and no partially updated sequence is ever observable.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    epoch: Epoch,
    stored_filename: Option<String>,
    frames: Arc<ArtifactSequence>,
    annotated: Arc<ArtifactSequence>,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore {
    /// An empty store at [`Epoch::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Epoch::ZERO,
            stored_filename: None,
            frames: Arc::new(ArtifactSequence::empty(Epoch::ZERO)),
            annotated: Arc::new(ArtifactSequence::empty(Epoch::ZERO)),
        }
    }

    /// The current cache epoch.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// The filename assigned by the most recent successful upload.
    #[must_use]
    pub fn stored_filename(&self) -> Option<&str> {
        self.stored_filename.as_deref()
    }

    /// The current sequence for `kind`.
    #[must_use]
    pub const fn get(&self, kind: SequenceKind) -> &Arc<ArtifactSequence> {
        match kind {
            SequenceKind::Frames => &self.frames,
            SequenceKind::AnnotatedFrames => &self.annotated,
        }
    }

    /// Swap in a new sequence for `kind` built from `urls`, bumping the
    /// epoch first so the new artifacts carry the fresh value.
    ///
    /// The epoch advances even when `urls` is empty.
    pub fn replace<I, S>(&mut self, kind: SequenceKind, urls: I) -> Epoch
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let epoch = self.epoch.next();
        let sequence = Arc::new(ArtifactSequence::from_urls(urls, epoch));
        *self.slot(kind) = sequence;
        self.epoch = epoch;
        epoch
    }

    /// Clear the sequence for `kind` without advancing the epoch.
    pub fn invalidate(&mut self, kind: SequenceKind) {
        let epoch = self.epoch;
        let slot = self.slot(kind);
        if !slot.is_empty() {
            *slot = Arc::new(ArtifactSequence::empty(epoch));
        }
    }

    /// Start over after a successful upload: record `filename`, clear
    /// both sequences, and advance the epoch.
    pub fn reset(&mut self, filename: impl Into<String>) -> Epoch {
        let epoch = self.epoch.next();
        self.epoch = epoch;
        self.stored_filename = Some(filename.into());
        self.frames = Arc::new(ArtifactSequence::empty(epoch));
        self.annotated = Arc::new(ArtifactSequence::empty(epoch));
        epoch
    }

    const fn slot(&mut self, kind: SequenceKind) -> &mut Arc<ArtifactSequence> {
        match kind {
            SequenceKind::Frames => &mut self.frames,
            SequenceKind::AnnotatedFrames => &mut self.annotated,
        }
    }
}
