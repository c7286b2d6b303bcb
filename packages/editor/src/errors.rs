//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Document error: {0}")]
    Document(#[from] mention_document::DocumentError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Autocomplete menu is not open")]
    MenuClosed,

    #[error("Item `{0}` has no children to open")]
    NotAGroup(String),
}
