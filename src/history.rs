//! Undo/redo of field edits.
//!
//! Programmatic updates (loading a node into the editor, applying an undo)
//! must not be recorded. They run while a [`SuppressGuard`] is alive; the
//! guard is a counter, so suppression nests and is released on every exit
//! path, early returns and panics included.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::tree::{FieldKey, NodeId};

/// One recorded field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Edited node.
    pub node: NodeId,
    /// Edited field.
    pub key: FieldKey,
    /// Value before the edit.
    pub before: String,
    /// Value after the edit.
    pub after: String,
}

impl HistoryEntry {
    /// The change that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            node: self.node,
            key: self.key,
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// Keeps recording suppressed until dropped.
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct SuppressGuard {
    depth: Rc<Cell<u32>>,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Undo and redo stacks.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    suppressed: Rc<Cell<u32>>,
}

impl History {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses recording for the lifetime of the returned guard.
    pub fn suppress(&self) -> SuppressGuard {
        self.suppressed.set(self.suppressed.get() + 1);
        SuppressGuard {
            depth: Rc::clone(&self.suppressed),
        }
    }

    /// Whether a guard is alive.
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get() > 0
    }

    /// Records a user edit. Returns `false` when the edit was dropped
    /// because recording is suppressed or nothing changed.
    pub fn record(&mut self, entry: HistoryEntry) -> bool {
        if self.is_suppressed() || entry.is_noop() {
            return false;
        }
        debug!("Recording {:?} change on {:?}", entry.key, entry.node);
        self.undo.push(entry);
        self.redo.clear();
        true
    }

    /// Pops the last edit and returns the change to apply to undo it.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo.pop()?;
        let inverse = entry.inverse();
        self.redo.push(entry);
        Some(inverse)
    }

    /// Pops the last undone edit and returns the change to re-apply.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        Some(entry)
    }

    /// Whether there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drops both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Drops every entry touching `node`.
    pub fn forget(&mut self, node: NodeId) {
        self.undo.retain(|entry| entry.node != node);
        self.redo.retain(|entry| entry.node != node);
    }
}
