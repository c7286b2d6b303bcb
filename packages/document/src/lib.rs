//! # Mention Document
//!
//! Document model and codecs for the mention-aware editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host value: JSON tree  |  "@mcp<app|tool>"  │
//! └─────────────────────────────────────────────┘
//!                     ↓ parse
//! ┌─────────────────────────────────────────────┐
//! │ Document: blocks → inline text + mentions   │
//! │  - flat position space for editing          │
//! │  - visitor traversal, statistics            │
//! └─────────────────────────────────────────────┘
//!                     ↓ serialize
//! ┌─────────────────────────────────────────────┐
//! │ host value (tree or flat string)            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use mention_document::{parse_flat, to_flat};
//!
//! let doc = parse_flat("ask @mcp<github|list_issues> please");
//! assert_eq!(doc.mention_count(), 1);
//! assert_eq!(to_flat(&doc), "ask @mcp<github|list_issues> please");
//! ```

mod codec;
mod error;
mod mention;
mod node;
mod visitor;

pub use codec::{
    parse, parse_flat, scan_tokens, serialize, strip_tokens, to_flat, truncate_flat, EditorValue, FlatToken, Format,
    SaveFormat,
};
pub use error::{DocumentError, DocumentResult};
pub use mention::{MentionAttrs, NormalizationPolicy, FLAT_TOKEN_PREFIX};
pub use node::{
    char_slice, content_size, Block, BlockPath, CodeBlockAttrs, Document, HeadingAttrs, Inline, Mark,
    OrderedListAttrs, ResolvedPos,
};
pub use visitor::{walk_block, walk_document, walk_inline, DocumentStats, FlatTextCollector, Visitor};
