//! # Mention Tokens
//!
//! A mention is an atomic inline element that references an external tool by
//! an `(app, tool)` pair. Inside the document it occupies a single position and
//! is never split; in the flat-string encoding it is written as
//! `@mcp<app|tool>`.

use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};

/// Prefix of the flat-string token form
pub const FLAT_TOKEN_PREFIX: &str = "@mcp<";

/// Attributes carried by a mention token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MentionAttrs {
    pub app: String,
    pub tool: String,
}

impl MentionAttrs {
    /// Create attributes from already-normalized values.
    ///
    /// Both values must be non-empty.
    pub fn new(app: impl Into<String>, tool: impl Into<String>) -> DocumentResult<Self> {
        let app = app.into();
        let tool = tool.into();

        if app.is_empty() {
            return Err(DocumentError::EmptyMentionAttribute("app"));
        }
        if tool.is_empty() {
            return Err(DocumentError::EmptyMentionAttribute("tool"));
        }

        Ok(Self { app, tool })
    }

    /// Create attributes from raw display names, applying `policy`
    pub fn normalized(app: &str, tool: &str, policy: &NormalizationPolicy) -> DocumentResult<Self> {
        Self::new(policy.normalize_app(app), policy.normalize_tool(tool))
    }

    /// Attributes recognized in a flat string (only lowercased, so that
    /// codec output survives a round-trip unchanged)
    pub(crate) fn from_flat(app: &str, tool: &str) -> DocumentResult<Self> {
        Self::new(app.to_ascii_lowercase(), tool.to_ascii_lowercase())
    }

    /// Flat-string form: `@mcp<app|tool>`
    pub fn to_flat_token(&self) -> String {
        format!("{}{}|{}>", FLAT_TOKEN_PREFIX, self.app, self.tool)
    }

    /// Length of the flat-string form in characters
    pub fn flat_len(&self) -> usize {
        FLAT_TOKEN_PREFIX.len() + self.app.chars().count() + 1 + self.tool.chars().count() + 1
    }

    /// Label shown on the rendered chip
    pub fn label(&self) -> String {
        format!("{}/{}", self.app, self.tool)
    }
}

/// How raw source names are turned into token attributes.
///
/// The defaults match the `@mcp<app|tool>` vocabulary: `"GitHub MCP"` becomes
/// `github`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizationPolicy {
    /// Lowercase both attributes
    pub lowercase: bool,

    /// Substrings removed from the app name (after lowercasing)
    pub strip_substrings: Vec<String>,

    /// Collapse runs of non-alphanumeric characters in the app name to `_`
    pub collapse_non_alphanumeric: bool,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_substrings: vec!["mcp".to_string()],
            collapse_non_alphanumeric: true,
        }
    }
}

impl NormalizationPolicy {
    pub fn normalize_app(&self, raw: &str) -> String {
        let mut value = if self.lowercase {
            raw.to_lowercase()
        } else {
            raw.to_string()
        };

        for needle in self.strip_substrings.iter().filter(|s| !s.is_empty()) {
            // Loop so that removals can't leave a fresh occurrence behind
            while value.contains(needle.as_str()) {
                value = value.replace(needle.as_str(), "");
            }
        }

        if self.collapse_non_alphanumeric {
            value = collapse_runs(&value);
        }

        value.trim_matches('_').to_string()
    }

    pub fn normalize_tool(&self, raw: &str) -> String {
        let value = if self.lowercase {
            raw.trim().to_lowercase()
        } else {
            raw.trim().to_string()
        };

        value
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

fn collapse_runs(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    out
}
