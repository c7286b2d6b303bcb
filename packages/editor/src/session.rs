//! # Autocomplete Session State
//!
//! Tracks one open/closed cycle of the autocomplete menu.
//!
//! A session starts when a trigger character is typed and ends on
//! selection, explicit close, or when the caret retreats to the trigger
//! position. Everything resets between sessions.

use crate::autocomplete::{MentionGroup, MentionGroupItem};

/// One drilled-into level of the menu
#[derive(Debug, Clone)]
pub struct MenuView {
    /// Label of the item that was opened
    pub title: String,
    pub groups: Vec<MentionGroup>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub open: bool,

    /// Text typed after the trigger (or after the last drill/back)
    pub query: String,

    /// Position right after the trigger character
    pub trigger_position: Option<usize>,

    /// Where the current query starts. Equals the trigger position until the
    /// menu is drilled into, which restarts the query at the caret.
    pub query_anchor: Option<usize>,

    pub view_stack: Vec<MenuView>,

    /// Index into the flattened visible item list
    pub highlighted: usize,
}

impl SessionState {
    pub fn opened(trigger_position: usize) -> Self {
        Self {
            open: true,
            trigger_position: Some(trigger_position),
            query_anchor: Some(trigger_position),
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_drilled(&self) -> bool {
        !self.view_stack.is_empty()
    }

    pub fn top_view(&self) -> Option<&MenuView> {
        self.view_stack.last()
    }
}

/// Flatten groups into the item order used for keyboard navigation
pub fn flatten_items(groups: &[MentionGroup]) -> Vec<MentionGroupItem> {
    groups.iter().flat_map(|group| group.items.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opened_session() {
        let state = SessionState::opened(6);
        assert!(state.open);
        assert_eq!(state.trigger_position, Some(6));
        assert_eq!(state.query_anchor, Some(6));
        assert!(!state.is_drilled());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = SessionState::opened(3);
        state.query = "li".into();
        state.view_stack.push(MenuView {
            title: "GitHub".into(),
            groups: vec![],
        });
        state.highlighted = 2;

        state.reset();
        assert!(!state.open);
        assert!(state.query.is_empty());
        assert_eq!(state.trigger_position, None);
        assert!(state.view_stack.is_empty());
        assert_eq!(state.highlighted, 0);
    }

    #[test]
    fn test_flatten_preserves_group_order() {
        let groups = vec![
            MentionGroup::new("A", vec![MentionGroupItem::new("1", "one"), MentionGroupItem::new("2", "two")]),
            MentionGroup::new("B", vec![MentionGroupItem::new("3", "three")]),
        ];
        let labels: Vec<_> = flatten_items(&groups).into_iter().map(|item| item.label).collect();
        assert_eq!(labels, vec!["one", "two", "three"]);
    }
}
