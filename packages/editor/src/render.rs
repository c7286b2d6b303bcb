//! # Render Output
//!
//! Describes the editing surface as data for the host to draw: one entry per
//! textblock, each a list of text segments (split at highlight boundaries)
//! and mention chips.

use crate::highlight::{HighlightRange, SearchHighlighter};
use crate::mention_node::MentionChip;
use mention_document::{Block, Document, Inline, Mark};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    CodeBlock { language: Option<String> },
}

/// Container a textblock sits in, innermost last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Container {
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Segment {
    Text {
        text: String,
        marks: Vec<Mark>,
        highlighted: bool,
        /// Part of the active search match
        active: bool,
    },
    Mention(MentionChip),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlock {
    pub kind: BlockKind,
    pub containers: Vec<Container>,

    /// Position where the block's content starts
    pub start: usize,
    pub segments: Vec<Segment>,
}

impl RenderedBlock {
    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text { text, .. } => text.clone(),
                Segment::Mention(chip) => chip.label.clone(),
            })
            .collect()
    }
}

pub fn render(doc: &Document, highlighter: &SearchHighlighter) -> Vec<RenderedBlock> {
    let mut renderer = Renderer {
        ranges: highlighter.ranges(),
        active: highlighter.active(),
        pos: 0,
        out: Vec::new(),
    };
    let mut containers = Vec::new();
    for block in &doc.content {
        renderer.block(block, &mut containers);
    }
    renderer.out
}

struct Renderer<'a> {
    ranges: &'a [HighlightRange],
    active: Option<HighlightRange>,
    pos: usize,
    out: Vec<RenderedBlock>,
}

impl Renderer<'_> {
    fn block(&mut self, block: &Block, containers: &mut Vec<Container>) {
        let (kind, content) = match block {
            Block::Paragraph { content } => (BlockKind::Paragraph, content),
            Block::Heading { attrs, content } => (BlockKind::Heading { level: attrs.level }, content),
            Block::CodeBlock { attrs, content } => (
                BlockKind::CodeBlock {
                    language: attrs.language.clone(),
                },
                content,
            ),
            Block::HorizontalRule => return,
            Block::BulletList { content }
            | Block::OrderedList { content, .. }
            | Block::ListItem { content }
            | Block::Blockquote { content } => {
                containers.push(container_of(block));
                for child in content {
                    self.block(child, containers);
                }
                containers.pop();
                return;
            }
        };

        if !self.out.is_empty() {
            self.pos += 1;
        }
        let start = self.pos;
        let mut segments = Vec::new();

        for inline in content {
            match inline {
                Inline::Text { text, marks } => self.text(text, marks, &mut segments),
                Inline::Mention { attrs } => {
                    segments.push(Segment::Mention(MentionChip::new(self.pos, attrs)));
                    self.pos += 1;
                }
            }
        }

        self.out.push(RenderedBlock {
            kind,
            containers: containers.clone(),
            start,
            segments,
        });
    }

    /// Split a run wherever the highlight state changes
    fn text(&mut self, text: &str, marks: &[Mark], segments: &mut Vec<Segment>) {
        let mut current = String::new();
        let mut state = None;

        for c in text.chars() {
            let next = (self.highlighted(self.pos), self.is_active(self.pos));
            if state.is_some_and(|s| s != next) {
                push_text(segments, std::mem::take(&mut current), marks, state);
            }
            state = Some(next);
            current.push(c);
            self.pos += 1;
        }

        if !current.is_empty() {
            push_text(segments, current, marks, state);
        }
    }

    fn highlighted(&self, pos: usize) -> bool {
        self.ranges.iter().any(|range| range.from <= pos && pos < range.to)
    }

    fn is_active(&self, pos: usize) -> bool {
        self.active.is_some_and(|range| range.from <= pos && pos < range.to)
    }
}

fn push_text(segments: &mut Vec<Segment>, text: String, marks: &[Mark], state: Option<(bool, bool)>) {
    let (highlighted, active) = state.unwrap_or_default();
    segments.push(Segment::Text {
        text,
        marks: marks.to_vec(),
        highlighted,
        active,
    });
}

fn container_of(block: &Block) -> Container {
    match block {
        Block::BulletList { .. } => Container::BulletList,
        Block::OrderedList { .. } => Container::OrderedList,
        Block::Blockquote { .. } => Container::Blockquote,
        _ => Container::ListItem,
    }
}
