//! # Autocomplete Controller
//!
//! State machine behind the mention menu:
//!
//! ```text
//!            trigger              type query
//! Closed ───────────► OpenRoot ─────────────► OpenSearching
//!   ▲                   │  ▲                       │
//!   │                   │  │ back                  │
//!   │    select leaf    ▼  │                       │
//!   └──── / Escape ── OpenDrilled ◄── select group ┘
//! ```
//!
//! ## Async work
//!
//! Provider calls run as tokio tasks in a `JoinSet` owned by the controller.
//! Each task carries the generation it was started for:
//!
//! - `session_id` changes on every open/close (root load)
//! - `nav_generation` changes on every drill/back (child load)
//! - `query_generation` changes on every query edit (debounced search)
//!
//! Results are committed by [`AutocompleteController::pump`] (non-blocking)
//! or [`AutocompleteController::settle`] (waits for all tasks). A result
//! whose generation is no longer current is dropped, so a slow response can
//! never overwrite newer state. Superseded tasks are also cancelled through
//! a per-query child `CancellationToken`; the debounce sleep runs inside the
//! cancellable future, so a keystroke burst reaches providers once.
//!
//! The controller never edits the document. Selecting a leaf item yields an
//! [`Insertion`] that the shell applies as one transaction before closing
//! the menu.

use super::cancel::run_until_cancelled;
use super::format::FormatterTable;
use super::provider::{ChildLoader, MentionGroup, MentionGroupItem, MentionProvider};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::mutations::{Mutation, Transaction};
use crate::session::{flatten_items, MenuView, SessionState};
use crate::trigger::TriggerDetector;
use futures::future::join_all;
use mention_document::{Document, Inline, MentionAttrs, NormalizationPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPhase {
    Closed,
    OpenRoot,
    OpenDrilled,
    OpenSearching,
}

/// Edit request produced by selecting a leaf item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Start of the trigger character and typed query
    pub from: usize,

    /// Caret at selection time
    pub to: usize,

    pub attrs: MentionAttrs,
}

impl Insertion {
    /// Delete trigger and query, insert the token and one space, caret after
    /// the space
    pub fn transaction(&self) -> Transaction {
        Transaction::single(Mutation::ReplaceRange {
            from: self.from,
            to: self.to,
            content: vec![Inline::mention(self.attrs.clone()), Inline::text(" ")],
        })
        .with_caret(self.from + 2)
        .with_description(format!("Insert {}", self.attrs.label()))
    }
}

/// What selecting an item did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The item has children; they are loading and will be pushed as a view
    Drilled,

    /// The item is a leaf; apply this and then close the menu
    Insert(Insertion),
}

#[derive(Debug)]
pub(crate) enum TaskOutcome {
    Root {
        session: u64,
        groups: Vec<MentionGroup>,
    },
    Children {
        session: u64,
        nav: u64,
        parent: MentionGroupItem,
        groups: Vec<MentionGroup>,
    },
    Search {
        session: u64,
        generation: u64,
        groups: Vec<MentionGroup>,
    },
    Cancelled,
}

pub struct AutocompleteController {
    providers: Vec<Arc<dyn MentionProvider>>,
    formatters: FormatterTable,
    policy: NormalizationPolicy,
    debounce: Duration,

    state: SessionState,

    /// Default groups of the root view
    root_groups: Vec<MentionGroup>,

    /// Debounced results for the current root query
    search_groups: Option<Vec<MentionGroup>>,

    tasks: JoinSet<TaskOutcome>,
    session_token: CancellationToken,
    query_token: CancellationToken,

    session_id: u64,
    nav_generation: u64,
    query_generation: u64,

    root_loading: bool,
    drill_loading: Option<u64>,
    search_loading: Option<u64>,
}

impl AutocompleteController {
    pub fn new(providers: Vec<Arc<dyn MentionProvider>>, config: &EditorConfig) -> Self {
        let session_token = CancellationToken::new();
        let query_token = session_token.child_token();
        Self {
            providers,
            formatters: FormatterTable::default(),
            policy: config.normalization.clone(),
            debounce: config.debounce(),
            state: SessionState::default(),
            root_groups: Vec::new(),
            search_groups: None,
            tasks: JoinSet::new(),
            session_token,
            query_token,
            session_id: 0,
            nav_generation: 0,
            query_generation: 0,
            root_loading: false,
            drill_loading: None,
            search_loading: None,
        }
    }

    pub fn with_formatters(mut self, formatters: FormatterTable) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn formatters_mut(&mut self) -> &mut FormatterTable {
        &mut self.formatters
    }

    // ------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.state.open
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    pub fn trigger_position(&self) -> Option<usize> {
        self.state.trigger_position
    }

    pub fn phase(&self) -> MenuPhase {
        if !self.state.open {
            MenuPhase::Closed
        } else if !self.state.query.is_empty() {
            MenuPhase::OpenSearching
        } else if self.state.is_drilled() {
            MenuPhase::OpenDrilled
        } else {
            MenuPhase::OpenRoot
        }
    }

    /// Whether async work for the current view is still in flight
    pub fn is_loading(&self) -> bool {
        if !self.state.open {
            return false;
        }
        self.root_loading
            || self.drill_loading == Some(self.nav_generation)
            || (self.search_loading == Some(self.query_generation) && !self.state.is_drilled())
    }

    /// Groups the menu shows right now
    pub fn visible_groups(&self) -> Vec<MentionGroup> {
        if !self.state.open {
            return Vec::new();
        }

        let query = self.state.query.as_str();

        if let Some(view) = self.state.top_view() {
            return view.groups.iter().filter_map(|group| group.filtered(query)).collect();
        }

        if query.is_empty() {
            return self.root_groups.clone();
        }

        match &self.search_groups {
            Some(groups) => groups.clone(),
            None => self.root_groups.iter().filter_map(|group| group.filtered(query)).collect(),
        }
    }

    pub fn visible_items(&self) -> Vec<MentionGroupItem> {
        flatten_items(&self.visible_groups())
    }

    pub fn highlighted(&self) -> usize {
        self.state.highlighted
    }

    pub fn highlighted_item(&self) -> Option<MentionGroupItem> {
        self.visible_items().into_iter().nth(self.state.highlighted)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Open the menu for a trigger typed right before `trigger_position`
    pub fn open(&mut self, trigger_position: usize) {
        if self.state.open {
            self.close();
        }

        self.state = SessionState::opened(trigger_position);
        self.root_groups.clear();
        self.search_groups = None;
        debug!(session = self.session_id, trigger_position, "Autocomplete opened");

        let providers = self.providers.clone();
        let session = self.session_id;
        let token = self.session_token.clone();
        self.root_loading = self.spawn(async move {
            run_until_cancelled(&token, provider_groups(&providers, ""), |groups| TaskOutcome::Root {
                session,
                groups,
            })
            .await
        });
    }

    /// Close the menu, cancelling and discarding all in-flight work
    pub fn close(&mut self) {
        if self.state.open {
            debug!(session = self.session_id, "Autocomplete closed");
        }

        self.session_token.cancel();
        self.tasks.abort_all();
        self.tasks = JoinSet::new();

        self.session_id += 1;
        self.session_token = CancellationToken::new();
        self.query_token = self.session_token.child_token();

        self.state.reset();
        self.root_groups.clear();
        self.search_groups = None;
        self.root_loading = false;
        self.drill_loading = None;
        self.search_loading = None;
    }

    /// Follow the caret after an edit. Returns whether the menu is still open.
    pub fn on_caret_moved(&mut self, doc: &Document, caret: usize) -> bool {
        let Some(trigger) = self.state.trigger_position else {
            return false;
        };

        if caret <= trigger {
            debug!(caret, trigger, "Caret retreated to the trigger, closing menu");
            self.close();
            return false;
        }

        let anchor = match self.state.query_anchor {
            Some(anchor) if anchor <= caret => anchor,
            _ => caret,
        };
        self.state.query_anchor = Some(anchor);

        let query = doc.text_between(anchor, caret);
        if query.contains('\n') {
            debug!("Caret left the trigger's block, closing menu");
            self.close();
            return false;
        }

        self.set_query(&query);
        true
    }

    /// Update the query, restarting the debounced search when needed
    pub fn set_query(&mut self, query: &str) {
        if !self.state.open || self.state.query == query {
            return;
        }

        self.state.query = query.to_string();
        self.state.highlighted = 0;
        self.search_groups = None;
        self.restart_search();
    }

    /// Cancel the pending search and schedule a new one for the current
    /// query. Drilled views and empty queries never search.
    fn restart_search(&mut self) {
        self.query_generation += 1;
        self.query_token.cancel();
        self.query_token = self.session_token.child_token();
        self.search_loading = None;

        if self.state.is_drilled() || self.state.query.is_empty() {
            return;
        }

        debug!(query = %self.state.query, generation = self.query_generation, "Scheduling search");

        let providers = self.providers.clone();
        let parents = self.child_parents();
        let query = self.state.query.clone();
        let debounce = self.debounce;
        let session = self.session_id;
        let generation = self.query_generation;
        let token = self.query_token.clone();

        let started = self.spawn(async move {
            let search = async move {
                tokio::time::sleep(debounce).await;
                debug!(query = %query, "Searching providers");
                let (mut groups, children) =
                    futures::join!(provider_groups(&providers, &query), child_matches(&parents, &query));
                groups.extend(children);
                groups
            };

            run_until_cancelled(&token, search, |groups| TaskOutcome::Search {
                session,
                generation,
                groups,
            })
            .await
        });

        if started {
            self.search_loading = Some(generation);
        }
    }

    /// Root items whose children take part in a search
    fn child_parents(&self) -> Vec<(MentionGroupItem, Arc<dyn ChildLoader>)> {
        self.root_groups
            .iter()
            .flat_map(|group| group.items.iter())
            .filter_map(|item| item.children.clone().map(|loader| (item.clone(), loader)))
            .collect()
    }

    /// Open an item's children as a new view
    pub fn drill(&mut self, item: &MentionGroupItem, caret: usize) -> Result<(), EditorError> {
        if !self.state.open {
            return Err(EditorError::MenuClosed);
        }
        let loader = item
            .children
            .clone()
            .ok_or_else(|| EditorError::NotAGroup(item.label.clone()))?;

        self.nav_generation += 1;
        self.restart_query_at(caret);

        let session = self.session_id;
        let nav = self.nav_generation;
        let parent = item.clone();
        let token = self.session_token.clone();
        debug!(item = %item.label, nav, "Loading children");

        let started = self.spawn(async move {
            let work = {
                let parent = parent.clone();
                async move { load_children(&parent, loader.as_ref()).await }
            };
            run_until_cancelled(&token, work, |groups| TaskOutcome::Children {
                session,
                nav,
                parent,
                groups,
            })
            .await
        });

        if started {
            self.drill_loading = Some(nav);
        }
        Ok(())
    }

    /// Pop one view. Returns false when already at the root.
    pub fn back(&mut self, caret: usize) -> bool {
        if !self.state.open {
            return false;
        }

        // Any pending drill is abandoned either way
        self.nav_generation += 1;
        self.drill_loading = None;

        if self.state.view_stack.pop().is_none() {
            return false;
        }

        self.restart_query_at(caret);
        true
    }

    fn restart_query_at(&mut self, caret: usize) {
        self.state.query_anchor = Some(caret);
        self.state.query.clear();
        self.state.highlighted = 0;
        self.search_groups = None;
        self.restart_search();
    }

    pub fn highlight_next(&mut self) {
        self.move_highlight(1);
    }

    pub fn highlight_previous(&mut self) {
        self.move_highlight(-1);
    }

    fn move_highlight(&mut self, delta: isize) {
        let count = self.visible_items().len();
        if count == 0 {
            self.state.highlighted = 0;
            return;
        }
        let current = self.state.highlighted.min(count - 1) as isize;
        self.state.highlighted = (current + delta).rem_euclid(count as isize) as usize;
    }

    /// Select an item: drill into groups, or compute the insertion for leaves.
    ///
    /// The insertion is computed synchronously from the item and the current
    /// document; the menu stays open until the shell closes it after the
    /// edit has been applied.
    pub fn select(
        &mut self,
        item: &MentionGroupItem,
        doc: &Document,
        caret: usize,
        triggers: &TriggerDetector,
    ) -> Result<Selection, EditorError> {
        if !self.state.open {
            return Err(EditorError::MenuClosed);
        }

        if item.has_children() {
            self.drill(item, caret)?;
            return Ok(Selection::Drilled);
        }

        let attrs = self.formatters.format(item, &self.policy)?;
        let trigger = self.state.trigger_position.unwrap_or(caret);

        let from = match trigger.checked_sub(1) {
            Some(before) if doc.text_between(before, trigger).chars().next().is_some_and(|c| triggers.is_trigger(c)) => {
                before
            }
            _ => trigger,
        };

        Ok(Selection::Insert(Insertion {
            from,
            to: caret.max(from),
            attrs,
        }))
    }

    pub fn select_index(
        &mut self,
        index: usize,
        doc: &Document,
        caret: usize,
        triggers: &TriggerDetector,
    ) -> Result<Option<Selection>, EditorError> {
        let Some(item) = self.visible_items().into_iter().nth(index) else {
            return Ok(None);
        };
        self.select(&item, doc, caret, triggers).map(Some)
    }

    // ------------------------------------------------------------------
    // Task plumbing
    // ------------------------------------------------------------------

    fn spawn<F>(&mut self, task: F) -> bool
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => {
                self.tasks.spawn_on(task, &handle);
                true
            }
            Err(_) => {
                warn!("No async runtime available, skipping provider call");
                false
            }
        }
    }

    /// Commit every finished task without waiting. Returns whether anything
    /// was committed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Some(joined) = self.tasks.try_join_next() {
            changed |= self.handle_joined(joined);
        }
        changed
    }

    /// Wait for all in-flight tasks and commit their results
    pub async fn settle(&mut self) -> bool {
        let mut changed = false;
        while let Some(joined) = self.tasks.join_next().await {
            changed |= self.handle_joined(joined);
        }
        changed
    }

    fn handle_joined(&mut self, joined: Result<TaskOutcome, JoinError>) -> bool {
        match joined {
            Ok(outcome) => self.commit(outcome),
            Err(e) if e.is_cancelled() => false,
            Err(e) => {
                warn!(error = %e, "Autocomplete task failed");
                false
            }
        }
    }

    pub(crate) fn commit(&mut self, outcome: TaskOutcome) -> bool {
        match outcome {
            TaskOutcome::Root { session, groups } => {
                if session != self.session_id || !self.state.open {
                    debug!(session, "Discarding stale root groups");
                    return false;
                }
                self.root_groups = groups;
                self.root_loading = false;

                // A search started before the root groups arrived saw no
                // parents to look under
                if !self.state.query.is_empty() && !self.state.is_drilled() && !self.child_parents().is_empty() {
                    debug!(query = %self.state.query, "Root groups arrived, searching again");
                    self.restart_search();
                }
                true
            }

            TaskOutcome::Children {
                session,
                nav,
                parent,
                groups,
            } => {
                if session != self.session_id || nav != self.nav_generation {
                    debug!(nav, item = %parent.label, "Discarding stale children");
                    return false;
                }
                self.state.view_stack.push(MenuView {
                    title: parent.label,
                    groups,
                });
                self.state.highlighted = 0;
                self.drill_loading = None;
                true
            }

            TaskOutcome::Search {
                session,
                generation,
                groups,
            } => {
                if session != self.session_id || generation != self.query_generation {
                    debug!(generation, current = self.query_generation, "Discarding stale search results");
                    return false;
                }
                self.search_groups = Some(groups);
                self.state.highlighted = 0;
                self.search_loading = None;
                true
            }

            TaskOutcome::Cancelled => false,
        }
    }
}

impl Drop for AutocompleteController {
    fn drop(&mut self) {
        self.session_token.cancel();
    }
}

/// Query every provider, one group per provider. Failures are logged and
/// count as no results.
async fn provider_groups(providers: &[Arc<dyn MentionProvider>], query: &str) -> Vec<MentionGroup> {
    let searches = providers.iter().map(|provider| async move {
        match provider.search(query).await {
            Ok(items) => {
                let items = items
                    .into_iter()
                    .map(|mut item| {
                        if item.item_type.is_none() {
                            item.item_type = Some(provider.type_name().to_string());
                        }
                        item
                    })
                    .collect();
                Some(MentionGroup::new(provider.group_label(), items))
            }
            Err(e) => {
                warn!(provider = provider.group_label(), query = %query, error = %e, "Provider search failed");
                None
            }
        }
    });

    join_all(searches)
        .await
        .into_iter()
        .flatten()
        .filter(|group| !group.items.is_empty())
        .collect()
}

/// One level deep search below root items: each parent's children matching
/// `query` become one group labelled with the parent
async fn child_matches(parents: &[(MentionGroupItem, Arc<dyn ChildLoader>)], query: &str) -> Vec<MentionGroup> {
    let loads = parents.iter().map(|(parent, loader)| async move {
        let groups = load_children(parent, loader.as_ref()).await;
        let items: Vec<_> = groups
            .into_iter()
            .flat_map(|group| group.items)
            .filter(|item| item.matches(query))
            .collect();
        (!items.is_empty()).then(|| MentionGroup::new(parent.label.clone(), items))
    });

    join_all(loads).await.into_iter().flatten().collect()
}

async fn load_children(parent: &MentionGroupItem, loader: &dyn ChildLoader) -> Vec<MentionGroup> {
    match loader.load().await {
        Ok(groups) => groups
            .into_iter()
            .map(|group| MentionGroup {
                group_label: group.group_label,
                items: group.items.into_iter().map(|item| item.inherit(parent)).collect(),
            })
            .collect(),
        Err(e) => {
            warn!(item = %parent.label, error = %e, "Child loader failed");
            Vec::new()
        }
    }
}
