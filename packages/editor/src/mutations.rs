//! # Document Mutations
//!
//! Semantic operations on the mention document. All edits made by the
//! editor shell go through these; the autocomplete controller only produces
//! mutation requests and never touches the tree itself.
//!
//! ## Mutation Semantics
//!
//! ### InsertText / DeleteRange / ReplaceRange
//! - Positions use the document's flat position space
//! - A mention occupies one position, so a range either covers it
//!   completely or not at all; there is no partial token
//!
//! ### RemoveMention
//! - Two-tier resolution (hinted position, then attribute scan)
//! - Unresolvable requests are logged no-ops
//!
//! ### ClearMentions
//! - Removes every token, leaving surrounding text untouched
//!
//! ## Transactions
//!
//! A [`Transaction`] applies a list of mutations all-or-nothing: it runs on a
//! copy of the document and only replaces the original when every step
//! succeeded, so no intermediate state is ever observable.

use crate::mention_node::{resolve_mention, RemovalRequest};
use mention_document::{Document, DocumentError, Inline, MentionAttrs};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Semantic mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert plain text, inheriting the marks of the preceding run
    InsertText { pos: usize, text: String },

    /// Delete `[from, to)`
    DeleteRange { from: usize, to: usize },

    /// Replace `[from, to)` with inline content
    ReplaceRange {
        from: usize,
        to: usize,
        content: Vec<Inline>,
    },

    /// Insert a mention token
    InsertMention { pos: usize, attrs: MentionAttrs },

    /// Remove one mention token
    RemoveMention { hint: Option<usize>, attrs: MentionAttrs },

    /// Remove every mention token
    ClearMentions,

    /// Split the textblock at `pos` (Enter)
    SplitBlock { pos: usize },
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("Position {pos} is outside the document (size {size})")]
    OutOfBounds { pos: usize, size: usize },
}

/// One contiguous change, used to map positions (such as the caret) from
/// the old document to the new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub from: usize,
    pub deleted: usize,
    pub inserted: usize,
}

impl Change {
    /// Map a position across this change. Positions inside the deleted span
    /// land after the inserted content.
    pub fn map(&self, pos: usize) -> usize {
        if pos <= self.from {
            pos
        } else if pos >= self.from + self.deleted {
            pos - self.deleted + self.inserted
        } else {
            self.from + self.inserted
        }
    }
}

/// Map a position through changes in application order
pub fn map_position(changes: &[Change], pos: usize) -> usize {
    changes.iter().fold(pos, |pos, change| change.map(pos))
}

impl Mutation {
    /// Apply mutation with validation. Returns the changes made.
    pub fn apply(&self, doc: &mut Document) -> Result<Vec<Change>, MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::InsertText { pos, text } => {
                doc.insert_text(*pos, text)?;
                Ok(vec![Change {
                    from: *pos,
                    deleted: 0,
                    inserted: text.chars().count(),
                }])
            }

            Mutation::DeleteRange { from, to } => {
                doc.delete_range(*from, *to)?;
                Ok(vec![Change {
                    from: *from,
                    deleted: to - from,
                    inserted: 0,
                }])
            }

            Mutation::ReplaceRange { from, to, content } => {
                let inserted = content.iter().map(Inline::size).sum();
                doc.replace_range(*from, *to, content.clone())?;
                Ok(vec![Change {
                    from: *from,
                    deleted: to - from,
                    inserted,
                }])
            }

            Mutation::InsertMention { pos, attrs } => {
                doc.insert_inlines(*pos, vec![Inline::mention(attrs.clone())])?;
                Ok(vec![Change {
                    from: *pos,
                    deleted: 0,
                    inserted: 1,
                }])
            }

            Mutation::RemoveMention { hint, attrs } => Self::apply_remove_mention(doc, *hint, attrs),

            Mutation::ClearMentions => Self::apply_clear_mentions(doc),

            Mutation::SplitBlock { pos } => {
                doc.split_block(*pos)?;
                Ok(vec![Change {
                    from: *pos,
                    deleted: 0,
                    inserted: 1,
                }])
            }
        }
    }

    fn apply_remove_mention(
        doc: &mut Document,
        hint: Option<usize>,
        attrs: &MentionAttrs,
    ) -> Result<Vec<Change>, MutationError> {
        let Some(pos) = resolve_mention(doc, hint, attrs) else {
            return Ok(Vec::new());
        };

        doc.delete_range(pos, pos + 1)?;
        debug!(pos, app = %attrs.app, tool = %attrs.tool, "Removed mention");

        Ok(vec![Change {
            from: pos,
            deleted: 1,
            inserted: 0,
        }])
    }

    fn apply_clear_mentions(doc: &mut Document) -> Result<Vec<Change>, MutationError> {
        // Last to first so each change is expressed in the document as it
        // was when that token was removed
        let positions: Vec<usize> = doc.mentions().into_iter().map(|(pos, _)| pos).rev().collect();

        let mut changes = Vec::with_capacity(positions.len());
        for pos in positions {
            doc.delete_range(pos, pos + 1)?;
            changes.push(Change {
                from: pos,
                deleted: 1,
                inserted: 0,
            });
        }

        debug!(removed = changes.len(), "Cleared mentions");
        Ok(changes)
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        let size = doc.size();
        let check = |pos: usize| {
            if pos > size {
                Err(MutationError::OutOfBounds { pos, size })
            } else {
                Ok(())
            }
        };

        match self {
            Mutation::InsertText { pos, .. }
            | Mutation::InsertMention { pos, .. }
            | Mutation::SplitBlock { pos } => check(*pos),

            Mutation::DeleteRange { from, to } | Mutation::ReplaceRange { from, to, .. } => {
                if from > to {
                    return Err(MutationError::InvalidRange { from: *from, to: *to });
                }
                check(*to)
            }

            Mutation::RemoveMention { .. } | Mutation::ClearMentions => Ok(()),
        }
    }
}

impl From<RemovalRequest> for Mutation {
    fn from(request: RemovalRequest) -> Self {
        Mutation::RemoveMention {
            hint: request.hint,
            attrs: request.attrs,
        }
    }
}

/// Mutations applied together as one atomic edit and one undo step
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub mutations: Vec<Mutation>,

    /// Caret after the transaction. When unset, the caret is mapped through
    /// the changes.
    pub caret_after: Option<usize>,

    pub description: Option<String>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(mutation: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            ..Default::default()
        }
    }

    pub fn push(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    pub fn with_caret(mut self, caret: usize) -> Self {
        self.caret_after = Some(caret);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Apply every mutation or none. Returns the changes made.
    pub fn apply(&self, doc: &mut Document) -> Result<Vec<Change>, MutationError> {
        let mut working = doc.clone();
        let mut changes = Vec::new();

        for mutation in &self.mutations {
            changes.extend(mutation.apply(&mut working)?);
        }

        *doc = working;
        Ok(changes)
    }
}

/// Result of applying a transaction through the shell
#[derive(Debug, Clone)]
pub struct MutationResult {
    /// Document version after the edit
    pub version: u64,

    /// Caret after the edit
    pub caret: usize,

    pub changes: Vec<Change>,
}
