use crate::mention::MentionAttrs;
use crate::node::{Block, Document, Inline, Mark};

/// Visitor pattern for traversing the document tree depth-first
///
/// Default implementations walk the entire tree. Override specific visit_*
/// methods to act on the nodes you care about.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_inline(&mut self, inline: &Inline) {
        walk_inline(self, inline);
    }

    fn visit_text(&mut self, _text: &str, _marks: &[Mark]) {
        // Leaf node, no children to walk
    }

    fn visit_mention(&mut self, _attrs: &MentionAttrs) {
        // Leaf node, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for block in &doc.content {
        visitor.visit_block(block);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    if let Some(content) = block.inline_content() {
        for inline in content {
            visitor.visit_inline(inline);
        }
    } else if let Some(children) = block.children() {
        for child in children {
            visitor.visit_block(child);
        }
    }
}

pub fn walk_inline<V: Visitor>(visitor: &mut V, inline: &Inline) {
    match inline {
        Inline::Text { text, marks } => visitor.visit_text(text, marks),
        Inline::Mention { attrs } => visitor.visit_mention(attrs),
    }
}

/// Collects the flat-string form: text verbatim, mentions as
/// `@mcp<app|tool>`, block structure dropped
#[derive(Debug, Default)]
pub struct FlatTextCollector {
    pub output: String,
}

impl Visitor for FlatTextCollector {
    fn visit_text(&mut self, text: &str, _marks: &[Mark]) {
        self.output.push_str(text);
    }

    fn visit_mention(&mut self, attrs: &MentionAttrs) {
        self.output.push_str(&attrs.to_flat_token());
    }
}

/// Character, word and mention counts of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DocumentStats {
    /// Characters of the flat-string form
    pub characters: usize,

    /// Whitespace-delimited words of the flat-string form
    pub words: usize,

    pub mentions: usize,
}

#[derive(Default)]
struct StatsCollector {
    stats: DocumentStats,
    in_word: bool,
}

impl StatsCollector {
    fn push_chars(&mut self, chars: impl Iterator<Item = char>) {
        for c in chars {
            self.stats.characters += 1;
            if c.is_whitespace() {
                self.in_word = false;
            } else if !self.in_word {
                self.in_word = true;
                self.stats.words += 1;
            }
        }
    }
}

impl Visitor for StatsCollector {
    fn visit_text(&mut self, text: &str, _marks: &[Mark]) {
        self.push_chars(text.chars());
    }

    fn visit_mention(&mut self, attrs: &MentionAttrs) {
        self.stats.mentions += 1;
        self.push_chars(attrs.to_flat_token().chars());
    }
}

impl Document {
    pub fn stats(&self) -> DocumentStats {
        let mut collector = StatsCollector::default();
        collector.visit_document(self);
        collector.stats
    }

    pub fn character_count(&self) -> usize {
        self.stats().characters
    }

    pub fn word_count(&self) -> usize {
        self.stats().words
    }

    pub fn mention_count(&self) -> usize {
        self.stats().mentions
    }
}
