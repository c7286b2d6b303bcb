//! # Mention Node
//!
//! Editor-side behaviour of the mention token: how it renders and how a
//! removal request is resolved to a span of the document.
//!
//! ## Removal resolution
//!
//! A removal request carries the position the event was raised at (which
//! may be stale if the host's view was detached or re-rendered) and the
//! token's attributes:
//!
//! 1. The token at the hinted position, or directly before it for a boundary
//!    hit, is used when its attributes match.
//! 2. Otherwise the whole document is scanned for a token with equal
//!    `(app, tool)`.
//! 3. The resolved one-position span is removed.
//!
//! When both steps miss, the request is a logged no-op.

use mention_document::{Document, MentionAttrs};
use serde::Serialize;
use tracing::{debug, warn};

/// Rendered form of a mention: one chip with a removal affordance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionChip {
    /// Position of the token at render time
    pub pos: usize,
    pub attrs: MentionAttrs,
    pub label: String,

    /// The chip exposes a remove control (pointer) and is deleted as a unit
    /// by Backspace/Delete (keyboard)
    pub removable: bool,
}

impl MentionChip {
    pub fn new(pos: usize, attrs: &MentionAttrs) -> Self {
        Self {
            pos,
            attrs: attrs.clone(),
            label: attrs.label(),
            removable: true,
        }
    }

    /// Removal request raised by this chip's remove control
    pub fn removal_request(&self) -> RemovalRequest {
        RemovalRequest {
            hint: Some(self.pos),
            attrs: self.attrs.clone(),
        }
    }
}

/// A request to remove one mention token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    /// Position the event resolved to, if any
    pub hint: Option<usize>,
    pub attrs: MentionAttrs,
}

/// Find the position of the token a removal request refers to
pub fn resolve_mention(doc: &Document, hint: Option<usize>, attrs: &MentionAttrs) -> Option<usize> {
    if let Some(pos) = hint {
        if doc.mention_at(pos) == Some(attrs) {
            return Some(pos);
        }
        if pos > 0 && doc.mention_at(pos - 1) == Some(attrs) {
            return Some(pos - 1);
        }
        debug!(pos, app = %attrs.app, tool = %attrs.tool, "Mention not at hinted position, scanning document");
    }

    let found = doc
        .mentions()
        .into_iter()
        .find(|(_, candidate)| *candidate == attrs)
        .map(|(pos, _)| pos);

    if found.is_none() {
        warn!(app = %attrs.app, tool = %attrs.tool, "Mention to remove was not found");
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_document::parse_flat;

    fn attrs(app: &str, tool: &str) -> MentionAttrs {
        MentionAttrs::new(app, tool).unwrap()
    }

    #[test]
    fn test_resolves_at_hint() {
        let doc = parse_flat("ab@mcp<x|y>");
        assert_eq!(resolve_mention(&doc, Some(2), &attrs("x", "y")), Some(2));
    }

    #[test]
    fn test_resolves_boundary_hit() {
        let doc = parse_flat("ab@mcp<x|y>cd");
        assert_eq!(resolve_mention(&doc, Some(3), &attrs("x", "y")), Some(2));
    }

    #[test]
    fn test_stale_hint_falls_back_to_scan() {
        let doc = parse_flat("@mcp<p|q> text @mcp<x|y>");
        assert_eq!(resolve_mention(&doc, Some(0), &attrs("x", "y")), Some(7));
        assert_eq!(resolve_mention(&doc, Some(99), &attrs("x", "y")), Some(7));
        assert_eq!(resolve_mention(&doc, None, &attrs("p", "q")), Some(0));
    }

    #[test]
    fn test_unknown_mention_is_none() {
        let doc = parse_flat("plain");
        assert_eq!(resolve_mention(&doc, Some(1), &attrs("x", "y")), None);
    }

    #[test]
    fn test_chip_label() {
        let chip = MentionChip::new(4, &attrs("github", "list_issues"));
        assert_eq!(chip.label, "github/list_issues");
        assert_eq!(chip.removal_request().hint, Some(4));
    }
}
