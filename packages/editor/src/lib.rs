//! # Mention Editor
//!
//! Headless editing engine for text that mixes free-form prose with atomic
//! mention tokens.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ mention-document: tree + flat codec         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorShell                         │
//! │  - Mutations applied as transactions        │
//! │  - Trigger detection → autocomplete menu    │
//! │  - Async providers (debounced, cancellable) │
//! │  - Search highlights, undo/redo             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: render() output, popover anchor,      │
//! │       on_change(value)                      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Shell owns the document**: the autocomplete controller only reads
//!    positions and returns edit requests
//! 2. **Tokens are atomic**: a mention occupies one position and is never
//!    partially edited
//! 3. **Stale results never win**: every async result carries the
//!    generation it was started for and is dropped when that has moved on
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mention_editor::{EditorConfig, EditorShell, StaticProvider};
//!
//! let mut shell = EditorShell::new(EditorConfig::default(), vec![provider])
//!     .with_value("hello")
//!     .on_change(|value| println!("{value:?}"));
//!
//! shell.type_char('@')?;     // menu opens
//! shell.settle().await;      // default groups loaded
//! shell.select_item(0)?;     // token inserted, menu closed
//! ```

mod autocomplete;
mod config;
mod errors;
mod highlight;
mod keymap;
mod layout;
mod mention_node;
mod mutations;
mod popover;
mod render;
mod session;
mod shell;
mod trigger;
mod undo_stack;

pub use autocomplete::{
    AutocompleteController, ChildLoader, DefaultFormatter, FormatterTable, Insertion, ItemMeta, MentionFormatter,
    MentionGroup, MentionGroupItem, MentionProvider, MenuPhase, ProviderError, Selection, SourceKind, StaticChildren,
    StaticProvider,
};
pub use config::{EditorConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_HISTORY_DEPTH, DEFAULT_TRIGGER_CHARS};
pub use errors::EditorError;
pub use highlight::{HighlightRange, SearchBar, SearchHighlighter};
pub use keymap::{resolve as resolve_key, EditorCommand, Key, KeyContext, KeyEvent, Modifiers};
pub use layout::{caret_coordinates, popover_anchor, MonospaceMeasure, Point, TextMeasure, Viewport};
pub use mention_node::{resolve_mention, MentionChip, RemovalRequest};
pub use mutations::{map_position, Change, Mutation, MutationError, MutationResult, Transaction};
pub use popover::{PopoverContext, PopoverState};
pub use render::{render, BlockKind, Container, RenderedBlock, Segment};
pub use session::{MenuView, SessionState};
pub use shell::{ChangeCallback, EditorShell, MENU_POPOVER};
pub use trigger::{Keystroke, TriggerDetector};
pub use undo_stack::{HistoryEntry, Restored, UndoStack};

// Re-export the document crate for convenience
pub use mention_document;
