//! Mention sources consumed by the autocomplete menu

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider failed: {0}")]
    Failed(String),
}

/// External source of autocomplete items
#[async_trait]
pub trait MentionProvider: Send + Sync {
    /// Item type this provider produces (selects the insertion formatter)
    fn type_name(&self) -> &str;

    /// Label of the group the provider's items are shown under
    fn group_label(&self) -> &str;

    /// Items matching `query`; an empty query returns the default items
    async fn search(&self, query: &str) -> Result<Vec<MentionGroupItem>, ProviderError>;
}

/// Lazy loader for the next level of groups below an item
#[async_trait]
pub trait ChildLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<MentionGroup>, ProviderError>;
}

/// Extra data attached to an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One selectable entry of the menu
#[derive(Clone)]
pub struct MentionGroupItem {
    pub value: String,
    pub label: String,
    pub item_type: Option<String>,
    pub meta: Option<ItemMeta>,

    /// Present when the item opens a further level instead of inserting
    pub children: Option<Arc<dyn ChildLoader>>,
}

#[derive(Debug, Clone)]
pub struct MentionGroup {
    pub group_label: String,
    pub items: Vec<MentionGroupItem>,
}

impl fmt::Debug for MentionGroupItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionGroupItem")
            .field("value", &self.value)
            .field("label", &self.label)
            .field("item_type", &self.item_type)
            .field("meta", &self.meta)
            .field("children", &self.children.is_some())
            .finish()
    }
}

impl MentionGroupItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            item_type: None,
            meta: None,
            children: None,
        }
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.meta.get_or_insert_with(ItemMeta::default).app_name = Some(app_name.into());
        self
    }

    pub fn with_children(mut self, loader: Arc<dyn ChildLoader>) -> Self {
        self.children = Some(loader);
        self
    }

    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    pub fn app_name(&self) -> Option<&str> {
        self.meta.as_ref()?.app_name.as_deref()
    }

    /// Fill in type and meta from the item this one was loaded under
    pub fn inherit(mut self, parent: &MentionGroupItem) -> Self {
        if self.item_type.is_none() {
            self.item_type = parent.item_type.clone();
        }
        if self.app_name().is_none() {
            if let Some(app_name) = parent.app_name() {
                self = self.with_app_name(app_name);
            }
        }
        self
    }

    /// Case-insensitive substring match against the label
    pub fn matches(&self, query: &str) -> bool {
        query.is_empty() || self.label.to_lowercase().contains(&query.to_lowercase())
    }
}

impl MentionGroup {
    pub fn new(group_label: impl Into<String>, items: Vec<MentionGroupItem>) -> Self {
        Self {
            group_label: group_label.into(),
            items,
        }
    }

    /// Copy keeping only items that match `query`; `None` when nothing matches
    pub fn filtered(&self, query: &str) -> Option<MentionGroup> {
        let items: Vec<_> = self.items.iter().filter(|item| item.matches(query)).cloned().collect();
        if items.is_empty() {
            None
        } else {
            Some(MentionGroup::new(self.group_label.clone(), items))
        }
    }
}

/// Child loader over a fixed list of groups
#[derive(Debug, Clone)]
pub struct StaticChildren(pub Vec<MentionGroup>);

#[async_trait]
impl ChildLoader for StaticChildren {
    async fn load(&self) -> Result<Vec<MentionGroup>, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Provider over a fixed list of items, filtered by label
#[derive(Debug, Clone)]
pub struct StaticProvider {
    type_name: String,
    group_label: String,
    items: Vec<MentionGroupItem>,
}

impl StaticProvider {
    pub fn new(type_name: impl Into<String>, group_label: impl Into<String>, items: Vec<MentionGroupItem>) -> Self {
        Self {
            type_name: type_name.into(),
            group_label: group_label.into(),
            items,
        }
    }
}

#[async_trait]
impl MentionProvider for StaticProvider {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn group_label(&self) -> &str {
        &self.group_label
    }

    async fn search(&self, query: &str) -> Result<Vec<MentionGroupItem>, ProviderError> {
        Ok(self.items.iter().filter(|item| item.matches(query)).cloned().collect())
    }
}
