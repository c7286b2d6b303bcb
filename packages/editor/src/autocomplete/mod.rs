//! Autocomplete menu: providers, insertion formatters and the controller
//! that drives the menu's async state.

mod cancel;
mod controller;
mod format;
mod provider;

pub use controller::{AutocompleteController, Insertion, MenuPhase, Selection};
pub use format::{DefaultFormatter, FormatterTable, MentionFormatter, SourceKind};
pub use provider::{
    ChildLoader, ItemMeta, MentionGroup, MentionGroupItem, MentionProvider, ProviderError, StaticChildren,
    StaticProvider,
};
