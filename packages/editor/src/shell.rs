//! # Editor Shell
//!
//! Wires the document, trigger detection, search highlighting, the
//! autocomplete controller and undo history into one editable surface.
//!
//! ## Edit flow
//!
//! ```text
//! key event → keymap → command
//!   → Transaction applied to the document (all-or-nothing)
//!   → max-length enforcement (text format)
//!   → history step, highlight recompute
//!   → on_change(serialized value)
//!   → autocomplete follows the caret, popover re-anchored
//! ```
//!
//! ## Value synchronization
//!
//! The host passes values back in with [`EditorShell::set_value`]. A value
//! whose structural key matches what the shell would emit itself is
//! ignored, so echoing `on_change` output back never resets the caret or
//! loops.

use crate::autocomplete::{AutocompleteController, MentionProvider, Selection};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::highlight::{HighlightRange, SearchBar, SearchHighlighter};
use crate::keymap::{self, EditorCommand, KeyContext, KeyEvent};
use crate::layout::{self, MonospaceMeasure, Point, TextMeasure, Viewport};
use crate::mention_node::RemovalRequest;
use crate::mutations::{map_position, Change, Mutation, MutationResult, Transaction};
use crate::popover::PopoverContext;
use crate::render::{self, RenderedBlock};
use crate::trigger::TriggerDetector;
use crate::undo_stack::{HistoryEntry, UndoStack};
use mention_document::{
    parse, parse_flat, serialize, to_flat, truncate_flat, Document, DocumentStats, EditorValue, SaveFormat,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Owner name used when the shell opens the shared popover
pub const MENU_POPOVER: &str = "mention-menu";

pub type ChangeCallback = Box<dyn FnMut(&EditorValue) + Send>;

pub struct EditorShell {
    config: EditorConfig,
    document: Document,
    caret: usize,
    version: u64,

    triggers: TriggerDetector,
    highlighter: SearchHighlighter,
    search_bar: SearchBar,
    menu: AutocompleteController,
    history: UndoStack,

    popover: PopoverContext,
    measure: Arc<dyn TextMeasure>,
    viewport: Viewport,

    on_change: Option<ChangeCallback>,
}

impl EditorShell {
    pub fn new(config: EditorConfig, providers: Vec<Arc<dyn MentionProvider>>) -> Self {
        let menu = AutocompleteController::new(providers, &config);
        Self {
            triggers: TriggerDetector::new(config.trigger_chars.iter().copied()),
            history: UndoStack::with_max_levels(config.history_depth),
            config,
            document: Document::new(),
            caret: 0,
            version: 0,
            highlighter: SearchHighlighter::new(),
            search_bar: SearchBar::default(),
            menu,
            popover: PopoverContext::new(),
            measure: Arc::new(MonospaceMeasure {
                char_width: 8.0,
                line_height: 20.0,
            }),
            viewport: Viewport {
                width: 640.0,
                scroll_top: 0.0,
            },
            on_change: None,
        }
    }

    /// Initial value; the caret starts at the end
    pub fn with_value(mut self, value: impl Into<EditorValue>) -> Self {
        self.document = parse(&value.into());
        self.caret = self.document.size();
        self
    }

    pub fn with_popover(mut self, popover: PopoverContext) -> Self {
        self.popover = popover;
        self
    }

    pub fn with_measure(mut self, measure: Arc<dyn TextMeasure>, viewport: Viewport) -> Self {
        self.measure = measure;
        self.viewport = viewport;
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&EditorValue) + Send + 'static,
    {
        self.on_change = Some(Box::new(callback));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn menu(&self) -> &AutocompleteController {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut AutocompleteController {
        &mut self.menu
    }

    pub fn popover(&self) -> &PopoverContext {
        &self.popover
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn search_bar(&self) -> SearchBar {
        self.search_bar
    }

    pub fn highlights(&self) -> &[HighlightRange] {
        self.highlighter.ranges()
    }

    pub fn active_highlight(&self) -> Option<HighlightRange> {
        self.highlighter.active()
    }

    pub fn stats(&self) -> DocumentStats {
        self.document.stats()
    }

    pub fn render(&self) -> Vec<RenderedBlock> {
        render::render(&self.document, &self.highlighter)
    }

    // ------------------------------------------------------------------
    // Value synchronization
    // ------------------------------------------------------------------

    /// The document serialized in the configured save format
    pub fn value(&self) -> EditorValue {
        serialize(&self.document, self.config.save_format.into())
    }

    /// Replace the content from outside. Returns whether anything changed.
    pub fn set_value(&mut self, value: impl Into<EditorValue>) -> bool {
        let value = value.into();
        if value.structural_key() == self.value().structural_key() {
            return false;
        }

        let document = parse(&value);
        if document == self.document {
            return false;
        }

        debug!(version = self.version, "External value replaced the document");
        self.document = document;
        self.caret = self.caret.min(self.document.size());
        self.version += 1;
        self.history.clear();
        self.close_menu();
        self.highlighter.recompute(&self.document);
        true
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Move the caret (clamped to the document)
    pub fn set_caret(&mut self, pos: usize) {
        self.caret = pos.min(self.document.size());
        self.follow_caret();
    }

    /// Type one character, opening the menu on a trigger character
    pub fn type_char(&mut self, ch: char) -> Result<MutationResult, EditorError> {
        let before = self.document.clone();
        let caret_before = self.caret;

        let mut working = self.document.clone();
        let keystroke = self.triggers.on_keystroke(&mut working, self.caret, ch)?;
        self.document = working;
        self.caret = keystroke.caret;

        let result = self.commit(before, caret_before, None, keystroke.changes);

        match keystroke.trigger {
            Some(position) if self.caret == position => self.open_menu(position),
            _ => self.follow_caret(),
        }
        Ok(result)
    }

    pub fn insert_text(&mut self, text: &str) -> Result<MutationResult, EditorError> {
        self.apply(Transaction::single(Mutation::InsertText {
            pos: self.caret,
            text: text.to_string(),
        }))
    }

    /// Apply a transaction at the current caret as one undo step
    pub fn apply(&mut self, transaction: Transaction) -> Result<MutationResult, EditorError> {
        let result = self.apply_transaction(&transaction)?;
        self.follow_caret();
        Ok(result)
    }

    /// Delete backwards. A mention right before the caret goes as a whole.
    pub fn backspace(&mut self) -> Result<Option<MutationResult>, EditorError> {
        if self.caret == 0 {
            return Ok(None);
        }
        let pos = self.caret - 1;

        let mutation = match self.document.mention_at(pos) {
            Some(attrs) => Mutation::RemoveMention {
                hint: Some(pos),
                attrs: attrs.clone(),
            },
            None => Mutation::DeleteRange {
                from: pos,
                to: self.caret,
            },
        };

        let result = self.apply_transaction(&Transaction::single(mutation).with_caret(pos))?;
        self.follow_caret();
        Ok(Some(result))
    }

    /// Delete forwards. A mention right after the caret goes as a whole.
    pub fn delete_forward(&mut self) -> Result<Option<MutationResult>, EditorError> {
        if self.caret >= self.document.size() {
            return Ok(None);
        }
        let pos = self.caret;

        let mutation = match self.document.mention_at(pos) {
            Some(attrs) => Mutation::RemoveMention {
                hint: Some(pos),
                attrs: attrs.clone(),
            },
            None => Mutation::DeleteRange { from: pos, to: pos + 1 },
        };

        let result = self.apply_transaction(&Transaction::single(mutation).with_caret(pos))?;
        self.follow_caret();
        Ok(Some(result))
    }

    /// Remove the token a chip's remove control refers to
    pub fn remove_mention(&mut self, request: RemovalRequest) -> Result<MutationResult, EditorError> {
        self.apply(Transaction::single(request.into()).with_description("Remove mention"))
    }

    /// Remove every mention token (Mod+Shift+K)
    pub fn clear_mentions(&mut self) -> Result<MutationResult, EditorError> {
        self.apply(Transaction::single(Mutation::ClearMentions).with_description("Clear mentions"))
    }

    /// Split the current textblock (Enter)
    pub fn split(&mut self) -> Result<MutationResult, EditorError> {
        let pos = self.caret;
        self.apply(Transaction::single(Mutation::SplitBlock { pos }).with_caret(pos + 1))
    }

    fn apply_transaction(&mut self, transaction: &Transaction) -> Result<MutationResult, EditorError> {
        let before = self.document.clone();
        let caret_before = self.caret;

        let changes = transaction.apply(&mut self.document)?;
        self.caret = transaction
            .caret_after
            .unwrap_or_else(|| map_position(&changes, caret_before))
            .min(self.document.size());

        Ok(self.commit(before, caret_before, transaction.description.clone(), changes))
    }

    /// Bookkeeping after the document changed
    fn commit(
        &mut self,
        before: Document,
        caret_before: usize,
        description: Option<String>,
        changes: Vec<Change>,
    ) -> MutationResult {
        if before == self.document {
            return MutationResult {
                version: self.version,
                caret: self.caret,
                changes,
            };
        }

        self.enforce_max_length();
        if before == self.document {
            return MutationResult {
                version: self.version,
                caret: self.caret,
                changes: Vec::new(),
            };
        }

        self.version += 1;
        self.highlighter.recompute(&self.document);
        self.history.record(HistoryEntry {
            before,
            caret_before,
            after: self.document.clone(),
            caret_after: self.caret,
            description,
        });
        self.emit_change();

        MutationResult {
            version: self.version,
            caret: self.caret,
            changes,
        }
    }

    /// With the text format and a limit, keep the flat value within it
    fn enforce_max_length(&mut self) {
        let (SaveFormat::Text, Some(max)) = (self.config.save_format, self.config.max_length) else {
            return;
        };

        let flat = to_flat(&self.document);
        let truncated = truncate_flat(&flat, max);
        if truncated.len() == flat.len() {
            return;
        }

        debug!(max, length = flat.chars().count(), "Value over the length limit, truncating");
        self.document = parse_flat(truncated);
        self.caret = self.caret.min(self.document.size());
    }

    fn emit_change(&mut self) {
        let value = self.value();
        if let Some(callback) = self.on_change.as_mut() {
            callback(&value);
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let Some(restored) = self.history.undo() else {
            return false;
        };
        self.restore(restored.document, restored.caret);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(restored) = self.history.redo() else {
            return false;
        };
        self.restore(restored.document, restored.caret);
        true
    }

    fn restore(&mut self, document: Document, caret: usize) {
        self.close_menu();
        self.document = document;
        self.caret = caret.min(self.document.size());
        self.version += 1;
        self.highlighter.recompute(&self.document);
        self.emit_change();
    }

    // ------------------------------------------------------------------
    // Autocomplete
    // ------------------------------------------------------------------

    fn open_menu(&mut self, trigger_position: usize) {
        self.menu.open(trigger_position);
        self.popover.open(MENU_POPOVER, Some(self.anchor_at(self.caret)));
    }

    pub fn close_menu(&mut self) {
        let was_open = self.menu.is_open();
        self.menu.close();
        if was_open && self.popover.snapshot().owner.as_deref() == Some(MENU_POPOVER) {
            self.popover.close();
        }
    }

    /// Keep the menu's query and anchor in step with the caret
    fn follow_caret(&mut self) {
        if !self.menu.is_open() {
            return;
        }

        if self.menu.on_caret_moved(&self.document, self.caret) {
            self.popover.reposition(Some(self.anchor_at(self.caret)));
        } else if self.popover.snapshot().owner.as_deref() == Some(MENU_POPOVER) {
            self.popover.close();
        }
    }

    /// Select the visible item at `index`
    pub fn select_item(&mut self, index: usize) -> Result<(), EditorError> {
        if !self.menu.is_open() {
            return Err(EditorError::MenuClosed);
        }

        match self.menu.select_index(index, &self.document, self.caret, &self.triggers) {
            Ok(Some(Selection::Insert(insertion))) => {
                debug!(app = %insertion.attrs.app, tool = %insertion.attrs.tool, "Inserting mention");
                let applied = self.apply_transaction(&insertion.transaction());
                self.close_menu();
                applied.map(|_| ())
            }
            Ok(Some(Selection::Drilled)) | Ok(None) => Ok(()),
            Err(EditorError::Document(e)) => {
                warn!(error = %e, "Selected item could not be formatted as a mention");
                self.close_menu();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn select_highlighted(&mut self) -> Result<(), EditorError> {
        self.select_item(self.menu.highlighted())
    }

    /// Return to the previous menu level
    pub fn menu_back(&mut self) -> bool {
        self.menu.back(self.caret)
    }

    pub fn highlight_next(&mut self) {
        self.menu.highlight_next();
    }

    pub fn highlight_previous(&mut self) {
        self.menu.highlight_previous();
    }

    /// Pointer press outside the popover. Returns whether the menu closed.
    ///
    /// A popover another owner opened over the menu is left alone.
    pub fn click_outside(&mut self) -> bool {
        if !self.menu.is_open() {
            return false;
        }
        let owns_popover = self.popover.snapshot().owner.as_deref() == Some(MENU_POPOVER);
        if owns_popover && !self.popover.dismiss_outside() {
            return false;
        }
        self.menu.close();
        true
    }

    /// Commit finished provider calls without waiting
    pub fn pump(&mut self) -> bool {
        self.menu.pump()
    }

    /// Wait for all in-flight provider calls
    pub async fn settle(&mut self) -> bool {
        self.menu.settle().await
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.menu.is_open() {
            self.popover.reposition(Some(self.anchor_at(self.caret)));
        }
    }

    /// Where the menu popover is anchored, when the menu is open
    pub fn popover_anchor(&self) -> Option<Point> {
        self.menu.is_open().then(|| self.anchor_at(self.caret))
    }

    fn anchor_at(&self, pos: usize) -> Point {
        layout::popover_anchor(&self.document, pos, self.measure.as_ref(), self.viewport)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn set_search_term(&mut self, term: &str) {
        let case_sensitive = self.config.case_sensitive_search;
        self.set_search_term_with_case(term, case_sensitive);
    }

    pub fn set_search_term_with_case(&mut self, term: &str, case_sensitive: bool) {
        self.highlighter.set_search_term(term, case_sensitive, &self.document);
    }

    pub fn clear_search(&mut self) {
        self.highlighter.clear_search();
    }

    /// Mod+F: open the bar (focusing its input) or close it and clear the term
    pub fn toggle_search_bar(&mut self) {
        if self.search_bar.open {
            self.close_search_bar();
        } else {
            self.search_bar.open();
        }
    }

    pub fn close_search_bar(&mut self) {
        self.search_bar.close();
        self.clear_search();
    }

    pub fn next_match(&mut self) -> Option<HighlightRange> {
        self.highlighter.next_match()
    }

    pub fn previous_match(&mut self) -> Option<HighlightRange> {
        self.highlighter.previous_match()
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    fn key_context(&self) -> KeyContext {
        KeyContext {
            menu_open: self.menu.is_open(),
            menu_drilled: self.menu.state().is_drilled(),
            query_empty: self.menu.query().is_empty(),
            search_open: self.search_bar.open,
        }
    }

    /// Dispatch a key event. Returns whether the editor handled it.
    pub fn handle_key(&mut self, event: KeyEvent) -> Result<bool, EditorError> {
        let Some(command) = keymap::resolve(event, self.key_context()) else {
            return Ok(false);
        };
        self.execute(command)?;
        Ok(true)
    }

    pub fn execute(&mut self, command: EditorCommand) -> Result<(), EditorError> {
        match command {
            EditorCommand::InsertChar(ch) => {
                self.type_char(ch)?;
            }
            EditorCommand::SplitBlock => {
                self.split()?;
            }
            EditorCommand::Backspace => {
                self.backspace()?;
            }
            EditorCommand::DeleteForward => {
                self.delete_forward()?;
            }
            EditorCommand::CaretLeft => self.set_caret(self.caret.saturating_sub(1)),
            EditorCommand::CaretRight => self.set_caret(self.caret + 1),
            EditorCommand::ClearMentions => {
                self.clear_mentions()?;
            }
            EditorCommand::ToggleSearch => self.toggle_search_bar(),
            EditorCommand::CloseSearch => self.close_search_bar(),
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::MenuUp => self.highlight_previous(),
            EditorCommand::MenuDown => self.highlight_next(),
            EditorCommand::MenuSelect => self.select_highlighted()?,
            EditorCommand::MenuBack => {
                self.menu_back();
            }
            EditorCommand::CloseMenu => self.close_menu(),
        }
        Ok(())
    }
}
