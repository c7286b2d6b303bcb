//! Tests for longer mutation sequences
//!
//! This tests:
//! - Insert + remove + clear chains across blocks
//! - Undo/redo sequences through the history stack
//! - Atomic transactions (a failing step leaves nothing behind)
//! - Caret mapping through changes

use mention_editor::mention_document::{parse_flat, to_flat, Block, Document, Inline, MentionAttrs};
use mention_editor::{map_position, HistoryEntry, Mutation, MutationError, Transaction, UndoStack};
use pretty_assertions::assert_eq;

fn attrs(app: &str, tool: &str) -> MentionAttrs {
    MentionAttrs::new(app, tool).unwrap()
}

/// Apply a transaction and record it the way the shell does
fn apply_recorded(stack: &mut UndoStack, doc: &mut Document, tx: Transaction) -> Result<(), MutationError> {
    let before = doc.clone();
    let changes = tx.apply(doc)?;
    let caret = tx.caret_after.unwrap_or_else(|| map_position(&changes, 0));
    stack.record(HistoryEntry {
        before,
        caret_before: 0,
        after: doc.clone(),
        caret_after: caret,
        description: tx.description.clone(),
    });
    Ok(())
}

#[test]
fn test_insert_remove_clear_sequence() {
    let mut doc = parse_flat("ask  about ");
    let mut stack = UndoStack::new();

    apply_recorded(
        &mut stack,
        &mut doc,
        Transaction::single(Mutation::InsertMention {
            pos: 4,
            attrs: attrs("github", "list_issues"),
        }),
    )
    .unwrap();
    apply_recorded(
        &mut stack,
        &mut doc,
        Transaction::single(Mutation::InsertMention {
            pos: 12,
            attrs: attrs("slack", "post"),
        }),
    )
    .unwrap();
    assert_eq!(to_flat(&doc), "ask @mcp<github|list_issues> about @mcp<slack|post>");

    apply_recorded(
        &mut stack,
        &mut doc,
        Transaction::single(Mutation::RemoveMention {
            hint: None,
            attrs: attrs("github", "list_issues"),
        }),
    )
    .unwrap();
    assert_eq!(to_flat(&doc), "ask  about @mcp<slack|post>");

    apply_recorded(&mut stack, &mut doc, Transaction::single(Mutation::ClearMentions)).unwrap();
    assert_eq!(to_flat(&doc), "ask  about ");
    assert_eq!(stack.undo_count(), 4);

    // Walk all the way back, then forward again
    let mut restored = Vec::new();
    while let Some(step) = stack.undo() {
        restored.push(to_flat(&step.document));
    }
    assert_eq!(
        restored,
        vec![
            "ask  about @mcp<slack|post>",
            "ask @mcp<github|list_issues> about @mcp<slack|post>",
            "ask @mcp<github|list_issues> about ",
            "ask  about ",
        ]
    );

    let last = std::iter::from_fn(|| stack.redo()).last().unwrap();
    assert_eq!(to_flat(&last.document), "ask  about ");
    assert!(!stack.can_redo());
}

#[test]
fn test_new_edit_after_undo_drops_redo() {
    let mut doc = parse_flat("a");
    let mut stack = UndoStack::new();

    apply_recorded(
        &mut stack,
        &mut doc,
        Transaction::single(Mutation::InsertText {
            pos: 1,
            text: "b".into(),
        }),
    )
    .unwrap();
    let undone = stack.undo().unwrap();
    doc = undone.document;
    assert!(stack.can_redo());

    apply_recorded(
        &mut stack,
        &mut doc,
        Transaction::single(Mutation::InsertText {
            pos: 1,
            text: "c".into(),
        }),
    )
    .unwrap();
    assert!(!stack.can_redo());
    assert_eq!(to_flat(&doc), "ac");
}

#[test]
fn test_failed_transaction_leaves_document_untouched() {
    let mut doc = parse_flat("hello @mcp<x|y>");
    let before = doc.clone();

    let tx = Transaction::new()
        .push(Mutation::DeleteRange { from: 0, to: 5 })
        .push(Mutation::InsertText {
            pos: 99,
            text: "nope".into(),
        });

    let err = tx.apply(&mut doc).unwrap_err();
    assert!(matches!(err, MutationError::OutOfBounds { pos: 99, .. }));
    assert_eq!(doc, before);
}

#[test]
fn test_edits_across_blocks_keep_positions_consistent() {
    let mut doc = Document::from_blocks(vec![
        Block::paragraph(vec![Inline::text("first")]),
        Block::BulletList {
            content: vec![Block::ListItem {
                content: vec![Block::paragraph(vec![
                    Inline::text("item "),
                    Inline::mention(attrs("x", "y")),
                ])],
            }],
        },
    ]);
    // "first" = 0..5, boundary at 5, "item " = 6..11, token at 11
    assert_eq!(doc.size(), 12);
    assert_eq!(doc.mentions()[0].0, 11);

    Mutation::InsertText {
        pos: 5,
        text: "!".into(),
    }
    .apply(&mut doc)
    .unwrap();
    assert_eq!(doc.mentions()[0].0, 12);

    // Deleting across the boundary joins the blocks
    let changes = Mutation::DeleteRange { from: 5, to: 8 }.apply(&mut doc).unwrap();
    assert_eq!(doc.textblocks().len(), 1);
    assert_eq!(to_flat(&doc), "firsttem @mcp<x|y>");
    assert_eq!(map_position(&changes, 12), 9);
    assert_eq!(doc.mentions()[0].0, 9);
}
