//! # Document Tree
//!
//! The editable document is an ordered tree of blocks. Textblocks (paragraph,
//! heading, code block) hold inline content: text runs and mention tokens.
//! Container blocks (lists, list items, blockquotes) hold other blocks.
//!
//! ## Positions
//!
//! Positions address the inline content of the document as one flat space:
//!
//! ```text
//! paragraph "hi" + mention      paragraph "yo"
//! │ h │ i │ @ │               │ y │ o │
//! 0   1   2   3  (boundary)   4   5   6
//! ```
//!
//! Each character and each mention counts 1. Consecutive textblocks are
//! separated by one boundary position. For a single-paragraph document a
//! position is simply a character offset.

use crate::error::{DocumentError, DocumentResult};
use crate::mention::MentionAttrs;
use serde::{Deserialize, Serialize};

/// Root of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "doc")]
pub struct Document {
    #[serde(default)]
    pub content: Vec<Block>,
}

/// Block-level node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Inline>,
    },

    Heading {
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Inline>,
    },

    BulletList {
        #[serde(default)]
        content: Vec<Block>,
    },

    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default)]
        content: Vec<Block>,
    },

    ListItem {
        #[serde(default)]
        content: Vec<Block>,
    },

    Blockquote {
        #[serde(default)]
        content: Vec<Block>,
    },

    CodeBlock {
        #[serde(default)]
        attrs: CodeBlockAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Inline>,
    },

    HorizontalRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedListAttrs {
    pub start: u32,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        Self { start: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Inline node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },

    Mention { attrs: MentionAttrs },
}

/// Inline formatting carried by a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Code,
}

/// A position resolved to a textblock and an offset inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPos {
    /// Index of the textblock in document order
    pub block: usize,

    /// Offset inside that textblock's inline content
    pub offset: usize,

    /// Position where the textblock's content starts
    pub block_start: usize,
}

/// Address of a block: child indices from the root
pub type BlockPath = Vec<usize>;

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn mention(attrs: MentionAttrs) -> Self {
        Inline::Mention { attrs }
    }

    /// Number of positions this node occupies
    pub fn size(&self) -> usize {
        match self {
            Inline::Text { text, .. } => text.chars().count(),
            Inline::Mention { .. } => 1,
        }
    }

    pub fn as_mention(&self) -> Option<&MentionAttrs> {
        match self {
            Inline::Mention { attrs } => Some(attrs),
            Inline::Text { .. } => None,
        }
    }
}

impl Block {
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph { content }
    }

    pub fn heading(level: u8, content: Vec<Inline>) -> Self {
        Block::Heading {
            attrs: HeadingAttrs { level },
            content,
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.inline_content().is_some()
    }

    pub fn inline_content(&self) -> Option<&Vec<Inline>> {
        match self {
            Block::Paragraph { content }
            | Block::Heading { content, .. }
            | Block::CodeBlock { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn inline_content_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Block::Paragraph { content }
            | Block::Heading { content, .. }
            | Block::CodeBlock { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<Block>> {
        match self {
            Block::BulletList { content }
            | Block::OrderedList { content, .. }
            | Block::ListItem { content }
            | Block::Blockquote { content } => Some(content),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::BulletList { content }
            | Block::OrderedList { content, .. }
            | Block::ListItem { content }
            | Block::Blockquote { content } => Some(content),
            _ => None,
        }
    }

    fn has_textblock(&self) -> bool {
        self.is_textblock()
            || self
                .children()
                .is_some_and(|children| children.iter().any(Block::has_textblock))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document: a single empty paragraph
    pub fn new() -> Self {
        Self {
            content: vec![Block::paragraph(Vec::new())],
        }
    }

    /// Build a normalized document from blocks
    pub fn from_blocks(content: Vec<Block>) -> Self {
        let mut doc = Self { content };
        doc.normalize();
        doc
    }

    /// Single-paragraph document holding `content`
    pub fn from_inlines(content: Vec<Inline>) -> Self {
        Self::from_blocks(vec![Block::paragraph(content)])
    }

    /// Restore the structural invariants:
    /// - adjacent text runs with identical marks are merged, empty runs dropped
    /// - heading levels are clamped to 1..=3
    /// - containers without any textblock are removed
    /// - the document holds at least one textblock
    pub fn normalize(&mut self) {
        normalize_blocks(&mut self.content);

        if !self.content.iter().any(Block::has_textblock) {
            self.content.push(Block::paragraph(Vec::new()));
        }
    }

    /// Paths of all textblocks in document order
    pub fn textblock_paths(&self) -> Vec<BlockPath> {
        let mut paths = Vec::new();
        collect_textblock_paths(&self.content, &mut Vec::new(), &mut paths);
        paths
    }

    /// Inline content of every textblock in document order
    pub fn textblocks(&self) -> Vec<&[Inline]> {
        let mut out = Vec::new();
        collect_textblocks(&self.content, &mut out);
        out
    }

    pub fn block_at_path(&self, path: &[usize]) -> Option<&Block> {
        let (first, rest) = path.split_first()?;
        let mut block = self.content.get(*first)?;
        for index in rest {
            block = block.children()?.get(*index)?;
        }
        Some(block)
    }

    pub fn block_at_path_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (first, rest) = path.split_first()?;
        let mut block = self.content.get_mut(*first)?;
        for index in rest {
            block = block.children_mut()?.get_mut(*index)?;
        }
        Some(block)
    }

    /// Total number of positions
    pub fn size(&self) -> usize {
        let blocks = self.textblocks();
        let inner: usize = blocks.iter().map(|content| content_size(content)).sum();
        inner + blocks.len().saturating_sub(1)
    }

    /// Resolve a position to a textblock and offset. Boundary positions
    /// resolve to the end of the preceding textblock.
    pub fn resolve(&self, pos: usize) -> DocumentResult<ResolvedPos> {
        let mut start = 0;
        for (block, content) in self.textblocks().iter().enumerate() {
            let size = content_size(content);
            if pos <= start + size {
                return Ok(ResolvedPos {
                    block,
                    offset: pos - start,
                    block_start: start,
                });
            }
            start += size + 1;
        }

        Err(DocumentError::PositionOutOfRange {
            pos,
            size: self.size(),
        })
    }

    /// Start position of every textblock
    pub fn block_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut start = 0;
        for content in self.textblocks() {
            starts.push(start);
            start += content_size(content) + 1;
        }
        starts
    }

    /// Inline node occupying `[pos, pos + 1)` along with the position where
    /// the node starts
    pub fn node_at(&self, pos: usize) -> Option<(usize, &Inline)> {
        let resolved = self.resolve(pos).ok()?;
        let content = self.textblocks()[resolved.block];
        let mut offset = 0;
        for inline in content {
            let size = inline.size();
            if resolved.offset < offset + size {
                return Some((resolved.block_start + offset, inline));
            }
            offset += size;
        }
        None
    }

    /// Mention occupying `[pos, pos + 1)`, if any
    pub fn mention_at(&self, pos: usize) -> Option<&MentionAttrs> {
        match self.node_at(pos) {
            Some((start, inline)) if start == pos => inline.as_mention(),
            _ => None,
        }
    }

    /// Every mention with its position, in document order
    pub fn mentions(&self) -> Vec<(usize, &MentionAttrs)> {
        let mut out = Vec::new();
        let mut start = 0;
        for content in self.textblocks() {
            let mut pos = start;
            for inline in content {
                if let Some(attrs) = inline.as_mention() {
                    out.push((pos, attrs));
                }
                pos += inline.size();
            }
            start = pos + 1;
        }
        out
    }

    /// Every text run with its start position, in document order
    pub fn text_runs(&self) -> Vec<(usize, &str)> {
        let mut out = Vec::new();
        let mut start = 0;
        for content in self.textblocks() {
            let mut pos = start;
            for inline in content {
                if let Inline::Text { text, .. } = inline {
                    out.push((pos, text.as_str()));
                }
                pos += inline.size();
            }
            start = pos + 1;
        }
        out
    }

    /// Text between two positions. Mentions are rendered as `\u{FFFC}` and
    /// block boundaries as `\n`.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        let mut start = 0;
        for (index, content) in self.textblocks().iter().enumerate() {
            if index > 0 && start > from && start <= to {
                out.push('\n');
            }
            let mut pos = start;
            for inline in content.iter() {
                match inline {
                    Inline::Text { text, .. } => {
                        for c in text.chars() {
                            if pos >= from && pos < to {
                                out.push(c);
                            }
                            pos += 1;
                        }
                    }
                    Inline::Mention { .. } => {
                        if pos >= from && pos < to {
                            out.push('\u{FFFC}');
                        }
                        pos += 1;
                    }
                }
            }
            start = pos + 1;
        }
        out
    }

    /// Marks of the text run ending at `pos`, inherited by text typed there
    pub fn marks_at(&self, pos: usize) -> Vec<Mark> {
        if pos == 0 {
            return Vec::new();
        }
        match self.node_at(pos - 1) {
            Some((_, Inline::Text { marks, .. })) => marks.clone(),
            _ => Vec::new(),
        }
    }

    /// Replace `[from, to)` with `insert`. The inserted nodes land in the
    /// textblock containing `from`; textblocks fully or partly covered by the
    /// range are joined.
    pub fn replace_range(&mut self, from: usize, to: usize, insert: Vec<Inline>) -> DocumentResult<()> {
        if from > to {
            return Err(DocumentError::InvalidRange { from, to });
        }

        let start = self.resolve(from)?;
        let end = self.resolve(to)?;
        let paths = self.textblock_paths();

        if start.block == end.block {
            let content = self.textblock_mut(&paths[start.block])?;
            splice_content(content, start.offset, end.offset, insert);
            return Ok(());
        }

        let tail = {
            let content = self.textblock_mut(&paths[end.block])?;
            let size = content_size(content);
            slice_content(content, end.offset, size)
        };

        {
            let content = self.textblock_mut(&paths[start.block])?;
            let size = content_size(content);
            let mut replacement = insert;
            replacement.extend(tail);
            splice_content(content, start.offset, size, replacement);
        }

        // Reverse document order keeps the remaining paths valid
        for path in paths[start.block + 1..=end.block].iter().rev() {
            self.remove_block(path);
        }
        self.normalize();

        Ok(())
    }

    /// Insert inline nodes at `pos`
    pub fn insert_inlines(&mut self, pos: usize, insert: Vec<Inline>) -> DocumentResult<()> {
        self.replace_range(pos, pos, insert)
    }

    /// Insert text at `pos`, inheriting the marks of the preceding run
    pub fn insert_text(&mut self, pos: usize, text: &str) -> DocumentResult<()> {
        let marks = self.marks_at(pos);
        self.insert_inlines(
            pos,
            vec![Inline::Text {
                text: text.to_string(),
                marks,
            }],
        )
    }

    pub fn delete_range(&mut self, from: usize, to: usize) -> DocumentResult<()> {
        self.replace_range(from, to, Vec::new())
    }

    /// Split the textblock at `pos` into two sibling blocks of the same kind
    pub fn split_block(&mut self, pos: usize) -> DocumentResult<()> {
        let resolved = self.resolve(pos)?;
        let path = self.textblock_paths()[resolved.block].clone();

        let (parent_path, index) = match path.split_last() {
            Some((index, parent)) => (parent.to_vec(), *index),
            None => return Ok(()),
        };

        let block = self
            .block_at_path_mut(&path)
            .ok_or(DocumentError::PositionOutOfRange { pos, size: 0 })?;
        let content = block
            .inline_content_mut()
            .ok_or(DocumentError::PositionOutOfRange { pos, size: 0 })?;
        let size = content_size(content);
        let tail = slice_content(content, resolved.offset, size);
        splice_content(content, resolved.offset, size, Vec::new());

        let mut sibling = block.clone();
        if let Some(content) = sibling.inline_content_mut() {
            *content = tail;
            normalize_inlines(content);
        }

        let siblings = if parent_path.is_empty() {
            &mut self.content
        } else {
            self.block_at_path_mut(&parent_path)
                .and_then(Block::children_mut)
                .ok_or(DocumentError::PositionOutOfRange { pos, size: 0 })?
        };
        siblings.insert(index + 1, sibling);

        Ok(())
    }

    /// Remove every mention matching `predicate`. Returns how many were removed.
    pub fn remove_mentions_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&MentionAttrs) -> bool,
    {
        let mut removed = 0;
        for path in self.textblock_paths() {
            if let Some(content) = self.block_at_path_mut(&path).and_then(Block::inline_content_mut) {
                let before = content.len();
                content.retain(|inline| !inline.as_mention().is_some_and(&mut predicate));
                removed += before - content.len();
                normalize_inlines(content);
            }
        }
        removed
    }

    fn textblock_mut(&mut self, path: &[usize]) -> DocumentResult<&mut Vec<Inline>> {
        let size = self.size();
        self.block_at_path_mut(path)
            .and_then(Block::inline_content_mut)
            .ok_or(DocumentError::PositionOutOfRange { pos: 0, size })
    }

    /// Remove the block at `path`, then any ancestor container left empty
    fn remove_block(&mut self, path: &[usize]) {
        let Some((index, parent)) = path.split_last() else {
            return;
        };

        if parent.is_empty() {
            if *index < self.content.len() {
                self.content.remove(*index);
            }
            return;
        }

        let now_empty = match self.block_at_path_mut(parent).and_then(Block::children_mut) {
            Some(children) if *index < children.len() => {
                children.remove(*index);
                children.is_empty()
            }
            _ => false,
        };

        if now_empty {
            self.remove_block(parent);
        }
    }
}

/// Total positions of a textblock's inline content
pub fn content_size(content: &[Inline]) -> usize {
    content.iter().map(Inline::size).sum()
}

/// Replace `[from, to)` of one textblock's content with `insert`
fn splice_content(content: &mut Vec<Inline>, from: usize, to: usize, insert: Vec<Inline>) {
    let size = content_size(content);
    let mut out = slice_content(content, 0, from.min(size));
    out.extend(insert);
    out.extend(slice_content(content, to.min(size), size));
    normalize_inlines(&mut out);
    *content = out;
}

/// Copy of `[from, to)` of one textblock's content
fn slice_content(content: &[Inline], from: usize, to: usize) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut pos = 0;

    for inline in content {
        let size = inline.size();
        let (start, end) = (pos, pos + size);
        pos = end;

        if end <= from || start >= to {
            continue;
        }

        match inline {
            Inline::Text { text, marks } => {
                let lo = from.saturating_sub(start);
                let hi = (to - start).min(size);
                out.push(Inline::Text {
                    text: char_slice(text, lo, hi).to_string(),
                    marks: marks.clone(),
                });
            }
            // Atomic: included only when fully covered
            Inline::Mention { .. } => {
                if start >= from && end <= to {
                    out.push(inline.clone());
                }
            }
        }
    }

    out
}

/// Substring by character offsets
pub fn char_slice(text: &str, from: usize, to: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(index, _)| index)
            .unwrap_or(text.len())
    };
    &text[byte_at(from)..byte_at(to)]
}

fn normalize_inlines(content: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());

    for inline in content.drain(..) {
        match inline {
            Inline::Text { ref text, .. } if text.is_empty() => {}
            Inline::Text { text, marks } => match out.last_mut() {
                Some(Inline::Text {
                    text: prev,
                    marks: prev_marks,
                }) if *prev_marks == marks => prev.push_str(&text),
                _ => out.push(Inline::Text { text, marks }),
            },
            mention => out.push(mention),
        }
    }

    *content = out;
}

fn normalize_blocks(blocks: &mut Vec<Block>) {
    for block in blocks.iter_mut() {
        match block {
            Block::Heading { attrs, content } => {
                attrs.level = attrs.level.clamp(1, 3);
                normalize_inlines(content);
            }
            Block::Paragraph { content } | Block::CodeBlock { content, .. } => {
                normalize_inlines(content);
            }
            Block::BulletList { content }
            | Block::OrderedList { content, .. }
            | Block::ListItem { content }
            | Block::Blockquote { content } => normalize_blocks(content),
            Block::HorizontalRule => {}
        }
    }

    blocks.retain(|block| block.children().is_none() || block.has_textblock());
}

fn collect_textblock_paths(blocks: &[Block], prefix: &mut Vec<usize>, out: &mut Vec<BlockPath>) {
    for (index, block) in blocks.iter().enumerate() {
        prefix.push(index);
        if block.is_textblock() {
            out.push(prefix.clone());
        } else if let Some(children) = block.children() {
            collect_textblock_paths(children, prefix, out);
        }
        prefix.pop();
    }
}

fn collect_textblocks<'a>(blocks: &'a [Block], out: &mut Vec<&'a [Inline]>) {
    for block in blocks {
        if let Some(content) = block.inline_content() {
            out.push(content);
        } else if let Some(children) = block.children() {
            collect_textblocks(children, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mention(app: &str, tool: &str) -> Inline {
        Inline::mention(MentionAttrs::new(app, tool).unwrap())
    }

    fn two_paragraphs() -> Document {
        Document::from_blocks(vec![
            Block::paragraph(vec![Inline::text("hi"), mention("a", "b")]),
            Block::paragraph(vec![Inline::text("yo")]),
        ])
    }

    #[test]
    fn test_empty_document_has_one_paragraph() {
        let doc = Document::from_blocks(vec![]);
        assert_eq!(doc.content, vec![Block::paragraph(vec![])]);
        assert_eq!(doc.size(), 0);
    }

    #[test]
    fn test_positions_across_blocks() {
        let doc = two_paragraphs();
        assert_eq!(doc.size(), 6);
        assert_eq!(doc.block_starts(), vec![0, 4]);

        let resolved = doc.resolve(3).unwrap();
        assert_eq!((resolved.block, resolved.offset), (0, 3));

        let resolved = doc.resolve(4).unwrap();
        assert_eq!((resolved.block, resolved.offset), (1, 0));

        assert!(doc.resolve(7).is_err());
    }

    #[test]
    fn test_mention_at_position() {
        let doc = two_paragraphs();
        assert_eq!(doc.mention_at(2).map(|m| m.tool.as_str()), Some("b"));
        assert!(doc.mention_at(1).is_none());
        assert_eq!(doc.mentions().len(), 1);
    }

    #[test]
    fn test_insert_text_splits_run() {
        let mut doc = Document::from_inlines(vec![Inline::text("helo")]);
        doc.insert_text(3, "l").unwrap();
        assert_eq!(doc.textblocks()[0], &[Inline::text("hello")]);
    }

    #[test]
    fn test_adjacent_runs_merge() {
        let doc = Document::from_inlines(vec![Inline::text("a"), Inline::text(""), Inline::text("b")]);
        assert_eq!(doc.textblocks()[0], &[Inline::text("ab")]);
    }

    #[test]
    fn test_runs_with_different_marks_stay_separate() {
        let bold = Inline::Text {
            text: "b".to_string(),
            marks: vec![Mark::Bold],
        };
        let doc = Document::from_inlines(vec![Inline::text("a"), bold.clone()]);
        assert_eq!(doc.textblocks()[0].len(), 2);
    }

    #[test]
    fn test_delete_across_blocks_joins_them() {
        let mut doc = two_paragraphs();
        doc.delete_range(1, 5).unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.textblocks()[0], &[Inline::text("ho")]);
    }

    #[test]
    fn test_delete_inside_nested_list_prunes_empty_containers() {
        let mut doc = Document::from_blocks(vec![
            Block::paragraph(vec![Inline::text("ab")]),
            Block::BulletList {
                content: vec![Block::ListItem {
                    content: vec![Block::paragraph(vec![Inline::text("cd")])],
                }],
            },
        ]);
        doc.delete_range(2, 5).unwrap();
        assert_eq!(doc.content, vec![Block::paragraph(vec![Inline::text("ab")])]);
    }

    #[test]
    fn test_split_block() {
        let mut doc = Document::from_inlines(vec![Inline::text("hello")]);
        doc.split_block(2).unwrap();
        assert_eq!(doc.textblocks(), vec![&[Inline::text("he")][..], &[Inline::text("llo")][..]]);
        assert_eq!(doc.size(), 6);
    }

    #[test]
    fn test_text_between() {
        let doc = two_paragraphs();
        assert_eq!(doc.text_between(0, 6), "hi\u{FFFC}\nyo");
        assert_eq!(doc.text_between(1, 2), "i");
    }

    #[test]
    fn test_heading_level_clamped() {
        let doc = Document::from_blocks(vec![Block::heading(6, vec![Inline::text("x")])]);
        assert_eq!(doc.content[0], Block::heading(3, vec![Inline::text("x")]));
    }

    #[test]
    fn test_remove_mentions_where() {
        let mut doc = Document::from_inlines(vec![
            Inline::text("a "),
            mention("x", "y"),
            Inline::text(" b"),
        ]);
        assert_eq!(doc.remove_mentions_where(|_| true), 1);
        assert_eq!(doc.textblocks()[0], &[Inline::text("a  b")]);
    }
}
