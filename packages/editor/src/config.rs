//! Editor configuration

use mention_document::{NormalizationPolicy, SaveFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TRIGGER_CHARS: [char; 3] = ['@', '/', '#'];
pub const DEFAULT_DEBOUNCE_MS: u64 = 120;
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Settings for one editor instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Characters that open the autocomplete menu
    pub trigger_chars: Vec<char>,

    /// Quiet period before a search query reaches providers
    pub debounce_ms: u64,

    /// Shape of the value passed to the change callback
    pub save_format: SaveFormat,

    /// Character limit of the flat value (text format only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Undo levels kept (0 = unlimited)
    pub history_depth: usize,

    /// How item names become token attributes
    pub normalization: NormalizationPolicy,

    /// Default case sensitivity of the search bar
    pub case_sensitive_search: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            trigger_chars: DEFAULT_TRIGGER_CHARS.to_vec(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            save_format: SaveFormat::Json,
            max_length: None,
            history_depth: DEFAULT_HISTORY_DEPTH,
            normalization: NormalizationPolicy::default(),
            case_sensitive_search: false,
        }
    }
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
