//! Error types for the document model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Mention attribute `{0}` is empty after normalization")]
    EmptyMentionAttribute(&'static str),

    #[error("Position {pos} is outside the document (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
