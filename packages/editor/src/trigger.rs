//! # Trigger Detection
//!
//! Watches typed characters for the configured trigger characters. A
//! trigger character is inserted literally (it stays visible in the
//! document) and the position right after it is reported so the
//! autocomplete menu can open there.

use crate::mutations::{Change, Mutation, MutationError};
use mention_document::Document;
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of one typed character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystroke {
    /// Caret after the character was inserted
    pub caret: usize,

    /// Position right after an inserted trigger character
    pub trigger: Option<usize>,

    pub changes: Vec<Change>,
}

#[derive(Debug, Clone)]
pub struct TriggerDetector {
    chars: BTreeSet<char>,
}

impl TriggerDetector {
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        Self {
            chars: chars.into_iter().collect(),
        }
    }

    pub fn is_trigger(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Insert `ch` at `caret`, reporting a trigger when `ch` is one of the
    /// configured characters
    pub fn on_keystroke(&self, doc: &mut Document, caret: usize, ch: char) -> Result<Keystroke, MutationError> {
        let changes = Mutation::InsertText {
            pos: caret,
            text: ch.to_string(),
        }
        .apply(doc)?;

        let after = caret + 1;
        let trigger = self.is_trigger(ch).then_some(after);
        if trigger.is_some() {
            debug!(trigger = %ch, position = after, "Trigger character typed");
        }

        Ok(Keystroke {
            caret: after,
            trigger,
            changes,
        })
    }
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TRIGGER_CHARS)
    }
}
