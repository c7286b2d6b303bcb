//! # Search Highlighting
//!
//! Computes highlighted ranges for a live search term over the text runs of
//! the document. Ranges are rebuilt from scratch after every document or
//! term change; documents are short, so no incremental bookkeeping is kept.
//! Highlighting is presentation only and never touches the document.

use mention_document::Document;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

/// Highlighted span `[from, to)` in document positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightRange {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Default)]
pub struct SearchHighlighter {
    term: String,
    case_sensitive: bool,
    matcher: Option<Regex>,
    ranges: Vec<HighlightRange>,
    active: Option<usize>,
}

impl SearchHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn set_search_term(&mut self, term: &str, case_sensitive: bool, doc: &Document) {
        self.term = term.to_string();
        self.case_sensitive = case_sensitive;
        self.matcher = build_matcher(term, case_sensitive);
        self.recompute(doc);
    }

    pub fn clear_search(&mut self) {
        self.term.clear();
        self.matcher = None;
        self.ranges.clear();
        self.active = None;
    }

    /// Rebuild the ranges for the current document
    pub fn recompute(&mut self, doc: &Document) {
        self.ranges = match &self.matcher {
            Some(matcher) => find_ranges(matcher, doc),
            None => Vec::new(),
        };
        self.active = if self.ranges.is_empty() { None } else { Some(0) };
        debug!(term = %self.term, matches = self.ranges.len(), "Search highlights recomputed");
    }

    pub fn ranges(&self) -> &[HighlightRange] {
        &self.ranges
    }

    pub fn active(&self) -> Option<HighlightRange> {
        self.active.and_then(|index| self.ranges.get(index).copied())
    }

    /// Move to the next match, wrapping around
    pub fn next_match(&mut self) -> Option<HighlightRange> {
        let len = self.ranges.len();
        if len == 0 {
            return None;
        }
        self.active = Some(self.active.map_or(0, |index| (index + 1) % len));
        self.active()
    }

    /// Move to the previous match, wrapping around
    pub fn previous_match(&mut self) -> Option<HighlightRange> {
        let len = self.ranges.len();
        if len == 0 {
            return None;
        }
        self.active = Some(self.active.map_or(len - 1, |index| (index + len - 1) % len));
        self.active()
    }

    /// Whether position `pos` is inside a highlighted range
    pub fn is_highlighted(&self, pos: usize) -> bool {
        self.ranges.iter().any(|range| range.from <= pos && pos < range.to)
    }
}

fn build_matcher(term: &str, case_sensitive: bool) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }

    match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(matcher) => Some(matcher),
        Err(e) => {
            warn!(error = %e, "Search term could not be compiled");
            None
        }
    }
}

fn find_ranges(matcher: &Regex, doc: &Document) -> Vec<HighlightRange> {
    let mut ranges = Vec::new();

    for (start, text) in doc.text_runs() {
        for found in matcher.find_iter(text) {
            let from = start + text[..found.start()].chars().count();
            let to = from + found.as_str().chars().count();
            ranges.push(HighlightRange { from, to });
        }
    }

    ranges
}

/// State of the inline search bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBar {
    pub open: bool,
    pub input_focused: bool,
}

impl SearchBar {
    pub fn open(&mut self) {
        self.open = true;
        self.input_focused = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.input_focused = false;
    }
}
