//! Pure predicates deciding which pipeline actions are currently allowed.

use crate::store::ArtifactStore;
use crate::types::{Action, MissingArtifact, PipelineError, SequenceKind, SourceFile};

/// A read-only view over session state answering "may this action run?".
///
/// Gates consult only upstream artifact presence. Whether another action
/// is in flight is the controller's concern, not the gate's.
#[derive(Debug, Clone, Copy)]
pub struct StageGate<'a> {
    store: &'a ArtifactStore,
    source: Option<&'a SourceFile>,
}

impl<'a> StageGate<'a> {
    /// Build a gate over the given store and selected source file.
    #[must_use]
    pub const fn new(store: &'a ArtifactStore, source: Option<&'a SourceFile>) -> Self {
        Self { store, source }
    }

    /// A video file has been selected.
    #[must_use]
    pub const fn can_upload(&self) -> bool {
        self.source.is_some()
    }

    /// An upload has completed and assigned a stored filename.
    #[must_use]
    pub fn can_extract(&self) -> bool {
        self.store.stored_filename().is_some()
    }

    /// Extracted frames are present.
    #[must_use]
    pub fn can_detect(&self) -> bool {
        self.can_extract() && !self.store.get(SequenceKind::Frames).is_empty()
    }

    /// Annotated frames are present.
    #[must_use]
    pub fn can_predict(&self) -> bool {
        self.can_extract() && !self.store.get(SequenceKind::AnnotatedFrames).is_empty()
    }

    /// Whether `action` is currently permitted.
    #[must_use]
    pub fn allows(&self, action: Action) -> bool {
        self.missing(action).is_none()
    }

    /// The first upstream input `action` is waiting for, if any.
    #[must_use]
    pub fn missing(&self, action: Action) -> Option<MissingArtifact> {
        match action {
            Action::Upload => (!self.can_upload()).then_some(MissingArtifact::SourceFile),
            Action::Extract => (!self.can_extract()).then_some(MissingArtifact::StoredFilename),
            Action::Detect => {
                if !self.can_extract() {
                    Some(MissingArtifact::StoredFilename)
                } else if !self.can_detect() {
                    Some(MissingArtifact::Frames)
                } else {
                    None
                }
            }
            Action::Predict => {
                if !self.can_extract() {
                    Some(MissingArtifact::StoredFilename)
                } else if !self.can_predict() {
                    Some(MissingArtifact::AnnotatedFrames)
                } else {
                    None
                }
            }
        }
    }

    /// Check `action` against its gate.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PreconditionNotMet`] naming the missing
    /// upstream artifact when the gate denies the action.
    pub fn check(&self, action: Action) -> Result<(), PipelineError> {
        match self.missing(action) {
            Some(missing) => Err(PipelineError::PreconditionNotMet { action, missing }),
            None => Ok(()),
        }
    }
}
