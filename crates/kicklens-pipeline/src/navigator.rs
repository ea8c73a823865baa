//! Bounded cursor over an artifact sequence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Artifact, ArtifactSequence, Epoch};

/// Position within a sequence of `length` items.
///
/// `index < length` whenever `length > 0`; otherwise `index == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    index: usize,
    length: usize,
}

impl Cursor {
    /// A cursor at the first item of a sequence of `length` items.
    #[must_use]
    pub const fn start(length: usize) -> Self {
        Self { index: 0, length }
    }

    /// Current index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Length of the underlying sequence.
    #[must_use]
    pub const fn length(self) -> usize {
        self.length
    }

    /// Advance by one, stopping at the last item.
    #[must_use]
    pub const fn next(self) -> Self {
        let last = self.length.saturating_sub(1);
        let index = if self.index < last { self.index + 1 } else { last };
        Self { index, ..self }
    }

    /// Step back by one, stopping at the first item.
    #[must_use]
    pub const fn prev(self) -> Self {
        Self {
            index: self.index.saturating_sub(1),
            ..self
        }
    }

    /// Jump to `index`, clamped into range.
    #[must_use]
    pub fn select(self, index: usize) -> Self {
        Self {
            index: index.min(self.length.saturating_sub(1)),
            ..self
        }
    }
}

/// Read-only navigator over one artifact sequence.
///
/// Holds a shared snapshot of the sequence; it never mutates artifacts
/// and never sees a partially replaced sequence.
#[derive(Debug, Clone, Default)]
pub struct FrameNavigator {
    sequence: Arc<ArtifactSequence>,
    cursor: Cursor,
}

impl FrameNavigator {
    /// A navigator bound to `sequence`, positioned at the first item.
    #[must_use]
    pub fn new(sequence: Arc<ArtifactSequence>) -> Self {
        let cursor = Cursor::start(sequence.len());
        Self { sequence, cursor }
    }

    /// Rebind to a new sequence and reset to the first item.
    pub fn bind(&mut self, sequence: Arc<ArtifactSequence>) {
        self.cursor = Cursor::start(sequence.len());
        self.sequence = sequence;
    }

    /// Move to the next artifact; a no-op at the end.
    pub fn next(&mut self) {
        self.cursor = self.cursor.next();
    }

    /// Move to the previous artifact; a no-op at the start.
    pub fn prev(&mut self) {
        self.cursor = self.cursor.prev();
    }

    /// Jump to `index`, clamped into range.
    pub fn select(&mut self, index: usize) {
        self.cursor = self.cursor.select(index);
    }

    /// The artifact under the cursor, or `None` for an empty sequence.
    #[must_use]
    pub fn current_artifact(&self) -> Option<&Artifact> {
        self.sequence.get(self.cursor.index)
    }

    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The bound sequence.
    #[must_use]
    pub fn sequence(&self) -> &Arc<ArtifactSequence> {
        &self.sequence
    }

    /// Epoch of the bound sequence.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.sequence.epoch()
    }

    /// One-based position and total, for "Frame i of n" labels.
    ///
    /// Returns `None` for an empty sequence.
    #[must_use]
    pub const fn position(&self) -> Option<(usize, usize)> {
        if self.cursor.length == 0 {
            None
        } else {
            Some((self.cursor.index + 1, self.cursor.length))
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cursor.length == 0
    }

    /// At the first item (or empty).
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.cursor.index == 0
    }

    /// At the last item (or empty).
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.cursor.index + 1 >= self.cursor.length
    }
}
