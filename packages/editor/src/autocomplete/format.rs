//! # Insertion Formatters
//!
//! Turns a selected menu item into mention attributes. Formatters are looked
//! up by the item's type; types without a registered formatter use the
//! default one.

use super::provider::MentionGroupItem;
use mention_document::{DocumentResult, MentionAttrs, NormalizationPolicy};
use std::collections::HashMap;
use std::sync::Arc;

/// Pure conversion of an item into token attributes
pub trait MentionFormatter: Send + Sync {
    fn format(&self, item: &MentionGroupItem, policy: &NormalizationPolicy) -> DocumentResult<MentionAttrs>;
}

/// Item types with a built-in formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Tool exposed by an MCP server: app from `meta.appName`, tool from the label
    Mcp,
}

impl SourceKind {
    pub fn type_name(self) -> &'static str {
        match self {
            SourceKind::Mcp => "mcp",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "mcp" => Some(SourceKind::Mcp),
            _ => None,
        }
    }
}

impl MentionFormatter for SourceKind {
    fn format(&self, item: &MentionGroupItem, policy: &NormalizationPolicy) -> DocumentResult<MentionAttrs> {
        match self {
            SourceKind::Mcp => {
                let app = item.app_name().unwrap_or(&item.value);
                MentionAttrs::normalized(app, &item.label, policy)
            }
        }
    }
}

/// Fallback: app from `meta.appName`, then the item type, then the value;
/// tool from the label
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl MentionFormatter for DefaultFormatter {
    fn format(&self, item: &MentionGroupItem, policy: &NormalizationPolicy) -> DocumentResult<MentionAttrs> {
        let app = item
            .app_name()
            .or(item.item_type.as_deref())
            .unwrap_or(&item.value);
        MentionAttrs::normalized(app, &item.label, policy)
    }
}

/// Per-type formatter lookup with a default
#[derive(Clone)]
pub struct FormatterTable {
    formatters: HashMap<String, Arc<dyn MentionFormatter>>,
    fallback: Arc<dyn MentionFormatter>,
}

impl Default for FormatterTable {
    fn default() -> Self {
        let mut table = Self {
            formatters: HashMap::new(),
            fallback: Arc::new(DefaultFormatter),
        };
        table.register(SourceKind::Mcp.type_name(), Arc::new(SourceKind::Mcp));
        table
    }
}

impl FormatterTable {
    pub fn register(&mut self, type_name: impl Into<String>, formatter: Arc<dyn MentionFormatter>) {
        self.formatters.insert(type_name.into(), formatter);
    }

    pub fn format(&self, item: &MentionGroupItem, policy: &NormalizationPolicy) -> DocumentResult<MentionAttrs> {
        let formatter = item
            .item_type
            .as_deref()
            .and_then(|name| self.formatters.get(name))
            .unwrap_or(&self.fallback);
        formatter.format(item, policy)
    }
}
