//! Integration tests for the editor shell
//!
//! Drives the shell the way a host would: key events in, values and render
//! output out.

use mention_editor::mention_document::{to_flat, EditorValue, SaveFormat};
use mention_editor::{
    EditorConfig, EditorShell, Key, KeyEvent, MentionGroupItem, MentionProvider, MenuPhase, MonospaceMeasure, Point,
    PopoverContext, Segment, StaticProvider, Viewport,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn github_tools() -> Arc<dyn MentionProvider> {
    Arc::new(StaticProvider::new(
        "mcp",
        "GitHub MCP",
        vec![
            MentionGroupItem::new("github:list_issues", "list_issues")
                .with_type("mcp")
                .with_app_name("GitHub MCP"),
            MentionGroupItem::new("github:create_pr", "create_pr")
                .with_type("mcp")
                .with_app_name("GitHub MCP"),
        ],
    ))
}

fn shell_with(value: &str) -> EditorShell {
    EditorShell::new(EditorConfig::default(), vec![github_tools()]).with_value(value)
}

fn type_str(shell: &mut EditorShell, text: &str) {
    for ch in text.chars() {
        shell.handle_key(KeyEvent::char(ch)).unwrap();
    }
}

fn recorder() -> (Arc<Mutex<Vec<EditorValue>>>, impl FnMut(&EditorValue) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |value: &EditorValue| sink.lock().unwrap().push(value.clone()))
}

#[tokio::test(start_paused = true)]
async fn test_typing_trigger_opens_menu() {
    let mut shell = shell_with("hello");
    assert_eq!(shell.caret(), 5);

    shell.handle_key(KeyEvent::char('@')).unwrap();

    assert_eq!(to_flat(shell.document()), "hello@");
    assert_eq!(shell.document().size(), 6);
    assert_eq!(shell.menu().phase(), MenuPhase::OpenRoot);
    assert_eq!(shell.menu().trigger_position(), Some(6));
    assert!(shell.popover().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_select_leaf_replaces_trigger_and_query() {
    let (seen, on_change) = recorder();
    let config = EditorConfig {
        save_format: SaveFormat::Text,
        ..Default::default()
    };
    let mut shell = EditorShell::new(config, vec![github_tools()])
        .with_value("hello")
        .on_change(on_change);

    type_str(&mut shell, "@li");
    assert_eq!(shell.menu().query(), "li");
    assert_eq!(shell.menu().trigger_position(), Some(6));

    shell.settle().await;
    let labels: Vec<_> = shell.menu().visible_items().into_iter().map(|item| item.label).collect();
    assert_eq!(labels, vec!["list_issues"]);

    shell.handle_key(KeyEvent::plain(Key::Enter)).unwrap();

    assert_eq!(to_flat(shell.document()), "hello@mcp<github|list_issues> ");
    assert_eq!(shell.caret(), 7);
    assert_eq!(shell.menu().phase(), MenuPhase::Closed);
    assert!(!shell.popover().is_open());

    let last = seen.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last, EditorValue::Text("hello@mcp<github|list_issues> ".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_mention_insertion_undoes_in_one_step() {
    let mut shell = shell_with("hello");
    type_str(&mut shell, "@li");
    shell.settle().await;
    shell.select_item(0).unwrap();

    shell.handle_key(KeyEvent::primary(Key::Char('z'))).unwrap();
    assert_eq!(to_flat(shell.document()), "hello@li");
    assert_eq!(shell.caret(), 8);

    shell.handle_key(KeyEvent::primary_shift(Key::Char('z'))).unwrap();
    assert_eq!(to_flat(shell.document()), "hello@mcp<github|list_issues> ");
}

#[tokio::test(start_paused = true)]
async fn test_backspace_to_trigger_closes_menu() {
    let mut shell = shell_with("hello");
    type_str(&mut shell, "@l");
    assert!(shell.menu().is_open());

    shell.handle_key(KeyEvent::plain(Key::Backspace)).unwrap();
    assert_eq!(to_flat(shell.document()), "hello@");
    assert!(!shell.menu().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_escape_closes_menu_without_edit() {
    let mut shell = shell_with("hi ");
    type_str(&mut shell, "#to");
    shell.handle_key(KeyEvent::plain(Key::Escape)).unwrap();

    assert!(!shell.menu().is_open());
    assert_eq!(to_flat(shell.document()), "hi #to");
    assert!(!shell.settle().await);
}

#[test]
fn test_clear_shortcut_removes_all_mentions() -> anyhow::Result<()> {
    let mut shell = shell_with("a @mcp<x|y> b @mcp<p|q> c");
    assert!(shell.handle_key(KeyEvent::primary_shift(Key::Char('K')))?);
    assert_eq!(to_flat(shell.document()), "a  b  c");
    assert_eq!(shell.stats().mentions, 0);

    // one undo step brings both back
    shell.undo();
    assert_eq!(shell.stats().mentions, 2);
    Ok(())
}

#[test]
fn test_search_highlights() {
    let mut shell = shell_with("hello hello");
    shell.handle_key(KeyEvent::primary(Key::Char('f'))).unwrap();
    assert!(shell.search_bar().input_focused);

    shell.set_search_term("ELL");
    let ranges: Vec<_> = shell.highlights().iter().map(|range| (range.from, range.to)).collect();
    assert_eq!(ranges, vec![(1, 4), (7, 10)]);

    // highlights follow edits
    shell.set_caret(0);
    shell.type_char('x').unwrap();
    let ranges: Vec<_> = shell.highlights().iter().map(|range| (range.from, range.to)).collect();
    assert_eq!(ranges, vec![(2, 5), (8, 11)]);
    assert_eq!(to_flat(shell.document()), "xhello hello");

    shell.handle_key(KeyEvent::plain(Key::Escape)).unwrap();
    assert!(shell.highlights().is_empty());
}

#[test]
fn test_echoed_value_does_not_reset_caret() {
    let (seen, on_change) = recorder();
    let mut shell = shell_with("abc").on_change(on_change);

    shell.set_caret(1);
    shell.type_char('x').unwrap();
    assert_eq!(shell.caret(), 2);

    let emitted = seen.lock().unwrap().last().cloned().unwrap();
    assert!(!shell.set_value(emitted));
    assert_eq!(shell.caret(), 2);

    assert!(shell.set_value("something else"));
    assert_eq!(to_flat(shell.document()), "something else");
    // external replacement is not echoed back
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_text_format_truncates_without_splitting_tokens() {
    let (seen, on_change) = recorder();
    let config = EditorConfig {
        save_format: SaveFormat::Text,
        max_length: Some(12),
        ..Default::default()
    };
    let mut shell = EditorShell::new(config, Vec::new())
        .with_value("ab @mcp<x|y>")
        .on_change(on_change);

    shell.set_caret(2);
    shell.insert_text("cd").unwrap();

    // "abcd @mcp<x|y>" is 14 characters; the token straddles the limit
    assert_eq!(to_flat(shell.document()), "abcd ");
    let last = seen.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last, EditorValue::Text("abcd ".to_string()));
}

#[test]
fn test_chip_removal_uses_attribute_fallback() {
    let mut shell = shell_with("a @mcp<x|y> b");
    let chip = shell
        .render()
        .into_iter()
        .flat_map(|block| block.segments)
        .find_map(|segment| match segment {
            Segment::Mention(chip) => Some(chip),
            _ => None,
        })
        .unwrap();

    // the document shifted after the chip was rendered
    shell.set_caret(0);
    shell.insert_text("zz").unwrap();

    shell.remove_mention(chip.removal_request()).unwrap();
    assert_eq!(to_flat(shell.document()), "zza  b");
}

#[tokio::test(start_paused = true)]
async fn test_locked_popover_survives_outside_click() {
    let popover = PopoverContext::new();
    let mut shell = shell_with("").with_popover(popover.clone());

    shell.type_char('@').unwrap();
    popover.lock();
    assert!(!shell.click_outside());
    assert!(shell.menu().is_open());

    popover.unlock();
    assert!(shell.click_outside());
    assert!(!shell.menu().is_open());
    assert!(!popover.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_outside_click_leaves_foreign_popover_open() {
    let popover = PopoverContext::new();
    let mut shell = shell_with("").with_popover(popover.clone());

    shell.type_char('@').unwrap();
    popover.open("link-editor", None);

    assert!(shell.click_outside());
    assert!(!shell.menu().is_open());
    assert!(popover.is_open());
    assert_eq!(popover.snapshot().owner.as_deref(), Some("link-editor"));
}

#[tokio::test(start_paused = true)]
async fn test_popover_anchor_follows_caret() {
    let measure = Arc::new(MonospaceMeasure {
        char_width: 10.0,
        line_height: 20.0,
    });
    let viewport = Viewport {
        width: 1000.0,
        scroll_top: 0.0,
    };
    let mut shell = shell_with("hello").with_measure(measure, viewport);

    assert_eq!(shell.popover_anchor(), None);

    shell.type_char('@').unwrap();
    assert_eq!(shell.popover_anchor(), Some(Point { x: 60.0, y: 20.0 }));

    shell.type_char('l').unwrap();
    assert_eq!(shell.popover().snapshot().anchor, Some(Point { x: 70.0, y: 20.0 }));
}

#[tokio::test(start_paused = true)]
async fn test_unformattable_item_closes_menu_without_edit() {
    let provider: Arc<dyn MentionProvider> = Arc::new(StaticProvider::new(
        "mcp",
        "Broken",
        vec![MentionGroupItem::new("v", "tool").with_app_name("MCP")],
    ));
    let mut shell = EditorShell::new(EditorConfig::default(), vec![provider]).with_value("hello");

    shell.type_char('@').unwrap();
    shell.settle().await;
    shell.select_item(0).unwrap();

    assert!(!shell.menu().is_open());
    assert_eq!(to_flat(shell.document()), "hello@");
}

#[test]
fn test_enter_splits_block_when_menu_closed() -> anyhow::Result<()> {
    let mut shell = shell_with("abcd");
    shell.set_caret(2);
    shell.handle_key(KeyEvent::plain(Key::Enter))?;

    let blocks = shell.render();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].plain_text(), "ab");
    assert_eq!(blocks[1].plain_text(), "cd");

    // flat form drops the block structure
    assert_eq!(to_flat(shell.document()), "abcd");
    Ok(())
}
