//! Keyboard surface of the editor

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// `primary` is Ctrl on Linux/Windows and Cmd on macOS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub primary: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn char(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    pub fn primary(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                primary: true,
                ..Default::default()
            },
        }
    }

    pub fn primary_shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                primary: true,
                shift: true,
                ..Default::default()
            },
        }
    }
}

/// What the editor is showing when a key arrives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyContext {
    pub menu_open: bool,
    pub menu_drilled: bool,
    pub query_empty: bool,
    pub search_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    InsertChar(char),
    SplitBlock,
    Backspace,
    DeleteForward,
    CaretLeft,
    CaretRight,
    ClearMentions,
    ToggleSearch,
    CloseSearch,
    Undo,
    Redo,
    MenuUp,
    MenuDown,
    MenuSelect,
    MenuBack,
    CloseMenu,
}

/// Map a key event to a command
pub fn resolve(event: KeyEvent, ctx: KeyContext) -> Option<EditorCommand> {
    use EditorCommand::*;

    let KeyEvent { key, modifiers } = event;

    if modifiers.primary {
        return match key {
            Key::Char(c) => match (c.to_ascii_lowercase(), modifiers.shift) {
                ('k', true) => Some(ClearMentions),
                ('f', false) => Some(ToggleSearch),
                ('z', false) => Some(Undo),
                ('z', true) | ('y', false) => Some(Redo),
                _ => None,
            },
            _ => None,
        };
    }

    match key {
        Key::Escape if ctx.menu_open => Some(CloseMenu),
        Key::Escape if ctx.search_open => Some(CloseSearch),
        Key::Escape => None,
        Key::Enter if ctx.menu_open => Some(MenuSelect),
        Key::Enter => Some(SplitBlock),
        Key::ArrowUp if ctx.menu_open => Some(MenuUp),
        Key::ArrowDown if ctx.menu_open => Some(MenuDown),
        Key::ArrowUp | Key::ArrowDown => None,
        Key::ArrowLeft if ctx.menu_open && ctx.menu_drilled && ctx.query_empty => Some(MenuBack),
        Key::ArrowLeft => Some(CaretLeft),
        Key::ArrowRight => Some(CaretRight),
        Key::Backspace => Some(Backspace),
        Key::Delete => Some(DeleteForward),
        Key::Char(c) if !c.is_control() => Some(InsertChar(c)),
        Key::Char(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcuts() {
        let ctx = KeyContext::default();
        assert_eq!(resolve(KeyEvent::primary_shift(Key::Char('K')), ctx), Some(EditorCommand::ClearMentions));
        assert_eq!(resolve(KeyEvent::primary(Key::Char('f')), ctx), Some(EditorCommand::ToggleSearch));
        assert_eq!(resolve(KeyEvent::primary(Key::Char('z')), ctx), Some(EditorCommand::Undo));
        assert_eq!(resolve(KeyEvent::primary_shift(Key::Char('z')), ctx), Some(EditorCommand::Redo));
        assert_eq!(resolve(KeyEvent::primary(Key::Char('q')), ctx), None);
    }

    #[test]
    fn test_escape_prefers_menu() {
        let ctx = KeyContext {
            menu_open: true,
            search_open: true,
            ..Default::default()
        };
        assert_eq!(resolve(KeyEvent::plain(Key::Escape), ctx), Some(EditorCommand::CloseMenu));

        let ctx = KeyContext {
            search_open: true,
            ..Default::default()
        };
        assert_eq!(resolve(KeyEvent::plain(Key::Escape), ctx), Some(EditorCommand::CloseSearch));
    }

    #[test]
    fn test_menu_navigation_only_when_open() {
        let open = KeyContext {
            menu_open: true,
            ..Default::default()
        };
        assert_eq!(resolve(KeyEvent::plain(Key::ArrowDown), open), Some(EditorCommand::MenuDown));
        assert_eq!(resolve(KeyEvent::plain(Key::Enter), open), Some(EditorCommand::MenuSelect));

        let closed = KeyContext::default();
        assert_eq!(resolve(KeyEvent::plain(Key::ArrowDown), closed), None);
        assert_eq!(resolve(KeyEvent::plain(Key::Enter), closed), Some(EditorCommand::SplitBlock));
    }

    #[test]
    fn test_back_requires_drilled_menu_and_empty_query() {
        let ctx = KeyContext {
            menu_open: true,
            menu_drilled: true,
            query_empty: true,
            search_open: false,
        };
        assert_eq!(resolve(KeyEvent::plain(Key::ArrowLeft), ctx), Some(EditorCommand::MenuBack));

        let typing = KeyContext {
            query_empty: false,
            ..ctx
        };
        assert_eq!(resolve(KeyEvent::plain(Key::ArrowLeft), typing), Some(EditorCommand::CaretLeft));
    }
}
