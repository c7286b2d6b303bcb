//! # Codec
//!
//! Converts between the document tree and its two external encodings:
//!
//! - **Tree**: the node tree as a nested JSON object (`{"type":"doc",...}`)
//! - **Flat**: plain text where mentions appear inline as `@mcp<app|tool>`
//!
//! Flattening drops block structure; parsing a flat string yields a single
//! paragraph. For any flat string produced here,
//! `to_flat(&parse_flat(s)) == s`.

use crate::error::{DocumentError, DocumentResult};
use crate::mention::MentionAttrs;
use crate::node::{Document, Inline};
use crate::visitor::{FlatTextCollector, Visitor};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;
use tracing::trace;

/// Inline token in flat text. Matches that fail this pattern stay literal text.
static FLAT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)@?mcp\s*<([a-z0-9_]+)\s*\|\s*([a-z0-9_]+)>").expect("flat token pattern is valid")
});

/// A document value as exchanged with the host: a structured tree or a
/// legacy flat string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditorValue {
    Tree(Document),
    Text(String),
}

/// Output shape of [`serialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Tree,
    Flat,
}

/// Persisted format chosen by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Json,
    Text,
}

impl From<SaveFormat> for Format {
    fn from(format: SaveFormat) -> Self {
        match format {
            SaveFormat::Json => Format::Tree,
            SaveFormat::Text => Format::Flat,
        }
    }
}

/// A mention token recognized in flat text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatToken {
    /// Byte range of the match
    pub range: Range<usize>,
    pub attrs: MentionAttrs,
}

impl From<Document> for EditorValue {
    fn from(doc: Document) -> Self {
        EditorValue::Tree(doc)
    }
}

impl From<String> for EditorValue {
    fn from(text: String) -> Self {
        EditorValue::Text(text)
    }
}

impl From<&str> for EditorValue {
    fn from(text: &str) -> Self {
        EditorValue::Text(text.to_string())
    }
}

impl EditorValue {
    /// Read a value from raw input: JSON objects are trees, anything else is
    /// flat text
    pub fn from_input(input: &str) -> DocumentResult<Self> {
        if input.trim_start().starts_with('{') {
            let doc: Document = serde_json::from_str(input)?;
            Ok(EditorValue::Tree(doc))
        } else {
            Ok(EditorValue::Text(input.to_string()))
        }
    }

    /// Key used to compare values by content rather than identity
    pub fn structural_key(&self) -> String {
        match self {
            EditorValue::Tree(doc) => {
                let mut doc = doc.clone();
                doc.normalize();
                let json = serde_json::to_string(&doc).unwrap_or_default();
                format!("tree:{json}")
            }
            EditorValue::Text(text) => format!("text:{text}"),
        }
    }

    pub fn to_json_string(&self, pretty: bool) -> DocumentResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(DocumentError::from)
    }
}

/// Parse a host value into a document. Trees pass through (normalized);
/// strings go through [`parse_flat`].
pub fn parse(value: &EditorValue) -> Document {
    match value {
        EditorValue::Tree(doc) => {
            let mut doc = doc.clone();
            doc.normalize();
            doc
        }
        EditorValue::Text(text) => parse_flat(text),
    }
}

/// Parse flat text into a single paragraph of text runs and mentions
pub fn parse_flat(text: &str) -> Document {
    let mut content = Vec::new();
    let mut last = 0;

    for token in scan_tokens(text) {
        if token.range.start > last {
            content.push(Inline::text(&text[last..token.range.start]));
        }
        content.push(Inline::mention(token.attrs));
        last = token.range.end;
    }

    if last < text.len() {
        content.push(Inline::text(&text[last..]));
    }

    Document::from_inlines(content)
}

/// Serialize a document in the requested format
pub fn serialize(doc: &Document, format: Format) -> EditorValue {
    match format {
        Format::Tree => EditorValue::Tree(doc.clone()),
        Format::Flat => EditorValue::Text(to_flat(doc)),
    }
}

/// Flat-string form of a document
pub fn to_flat(doc: &Document) -> String {
    let mut collector = FlatTextCollector::default();
    collector.visit_document(doc);
    collector.output
}

/// Every well-formed token in `text`, in order
pub fn scan_tokens(text: &str) -> Vec<FlatToken> {
    FLAT_TOKEN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let attrs = match MentionAttrs::from_flat(caps.get(1)?.as_str(), caps.get(2)?.as_str()) {
                Ok(attrs) => attrs,
                Err(e) => {
                    trace!(token = whole.as_str(), error = %e, "Leaving token as literal text");
                    return None;
                }
            };
            Some(FlatToken {
                range: whole.range(),
                attrs,
            })
        })
        .collect()
}

/// Remove every well-formed token from flat text, leaving the surrounding
/// text untouched
pub fn strip_tokens(text: &str) -> String {
    FLAT_TOKEN.replace_all(text, "").into_owned()
}

/// Longest prefix of `text` with at most `max_chars` characters that does
/// not end inside a token. A token straddling the limit is dropped whole.
pub fn truncate_flat(text: &str, max_chars: usize) -> &str {
    let Some((mut cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };

    if let Some(token) = scan_tokens(text)
        .into_iter()
        .find(|token| token.range.start < cut && cut < token.range.end)
    {
        cut = token.range.start;
    }

    &text[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Block;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_mixed_text_and_mention() {
        let doc = parse_flat("hello @mcp<github|list_issues> world");
        let blocks = doc.textblocks();

        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            &[
                Inline::text("hello "),
                Inline::mention(MentionAttrs::new("github", "list_issues").unwrap()),
                Inline::text(" world"),
            ]
        );
    }

    #[test]
    fn test_lenient_token_forms() {
        let doc = parse_flat("x MCP <GitHub | List_Issues> y");
        assert_eq!(to_flat(&doc), "x @mcp<github|list_issues> y");
    }

    #[test]
    fn test_malformed_tokens_stay_text() {
        for input in ["@mcp<git-hub|x>", "@mcp<a|>", "@mcp<a b>", "@mcp<a|b"] {
            let doc = parse_flat(input);
            assert_eq!(doc.mention_count(), 0, "{input}");
            assert_eq!(to_flat(&doc), input);
        }
    }

    #[test]
    fn test_flatten_drops_block_structure() {
        let doc = Document::from_blocks(vec![
            Block::heading(1, vec![Inline::text("Title")]),
            Block::paragraph(vec![
                Inline::text("use "),
                Inline::mention(MentionAttrs::new("slack", "post").unwrap()),
            ]),
        ]);
        assert_eq!(to_flat(&doc), "Titleuse @mcp<slack|post>");
    }

    #[test]
    fn test_tree_json_shape() {
        let doc = parse_flat("a @mcp<x|y>");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "doc",
                "content": [{
                    "type": "paragraph",
                    "content": [
                        { "type": "text", "text": "a " },
                        { "type": "mention", "attrs": { "app": "x", "tool": "y" } }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_value_from_input() {
        let tree = EditorValue::from_input(r#"{"type":"doc","content":[]}"#).unwrap();
        assert_eq!(parse(&tree), Document::new());

        let text = EditorValue::from_input("plain @mcp<a|b>").unwrap();
        assert_eq!(text, EditorValue::Text("plain @mcp<a|b>".to_string()));

        assert!(EditorValue::from_input("{ not json").is_err());
    }

    #[test]
    fn test_untagged_value_deserializes_both_shapes() {
        let text: EditorValue = serde_json::from_str(r#""hi""#).unwrap();
        assert_eq!(text, EditorValue::Text("hi".to_string()));

        let tree: EditorValue = serde_json::from_str(r#"{"type":"doc","content":[{"type":"paragraph"}]}"#).unwrap();
        assert_eq!(tree, EditorValue::Tree(Document::new()));
    }

    #[test]
    fn test_strip_tokens() {
        assert_eq!(strip_tokens("a @mcp<x|y> b @mcp<p|q> c"), "a  b  c");
    }

    #[test]
    fn test_truncate_never_splits_a_token() {
        let text = "ab @mcp<x|y> cd";
        assert_eq!(truncate_flat(text, 100), text);
        assert_eq!(truncate_flat(text, 2), "ab");
        // limit falls inside the token: the whole token goes
        assert_eq!(truncate_flat(text, 6), "ab ");
        // limit right after the token keeps it
        assert_eq!(truncate_flat(text, 12), "ab @mcp<x|y>");
        assert_eq!(truncate_flat("héllo", 2), "hé");
    }

    #[test]
    fn test_structural_key_ignores_unmerged_runs() {
        let merged = EditorValue::Tree(Document::from_inlines(vec![Inline::text("ab")]));
        let split = EditorValue::Tree(Document {
            content: vec![Block::paragraph(vec![Inline::text("a"), Inline::text("b")])],
        });
        assert_eq!(merged.structural_key(), split.structural_key());
        assert_ne!(merged.structural_key(), EditorValue::from("ab").structural_key());
    }
}
