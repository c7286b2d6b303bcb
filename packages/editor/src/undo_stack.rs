//! # Undo/Redo Stack
//!
//! Tracks edit history and enables undo/redo.
//!
//! ## Design
//!
//! - Each applied transaction records the document and caret before and
//!   after it
//! - Undo restores the "before" state and moves the entry to the redo stack
//! - Redo restores the "after" state
//! - New edits clear the redo stack
//! - One transaction is one undo step, so a mention insertion (trigger and
//!   query removal, token, trailing space) undoes in a single step

use mention_document::Document;

/// Snapshot pair recorded for one transaction
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub before: Document,
    pub caret_before: usize,
    pub after: Document,
    pub caret_after: usize,

    /// Optional description of this step
    pub description: Option<String>,
}

/// Document state restored by undo/redo
#[derive(Debug, Clone)]
pub struct Restored {
    pub document: Document,
    pub caret: usize,
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// Applied steps (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone steps (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record an applied step
    pub fn record(&mut self, entry: HistoryEntry) {
        if entry.before == entry.after {
            return;
        }

        self.redo_stack.clear();
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Step back. Returns the state to restore, if any.
    pub fn undo(&mut self) -> Option<Restored> {
        let entry = self.undo_stack.pop()?;
        let restored = Restored {
            document: entry.before.clone(),
            caret: entry.caret_before,
        };
        self.redo_stack.push(entry);
        Some(restored)
    }

    /// Step forward again. Returns the state to restore, if any.
    pub fn redo(&mut self) -> Option<Restored> {
        let entry = self.redo_stack.pop()?;
        let restored = Restored {
            document: entry.after.clone(),
            caret: entry.caret_after,
        };
        self.undo_stack.push(entry);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget all history (e.g. when the host replaces the value)
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Description of the next step to undo
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last()?.description.as_deref()
    }
}
