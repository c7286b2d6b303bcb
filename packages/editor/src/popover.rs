//! # Popover Context
//!
//! Explicit handle for showing popover UI. The host creates one context and
//! passes clones to whatever needs to show a popover; all clones share the
//! same state.
//!
//! Lifecycle: `open` → (`reposition`)* → `close`. While `lock`ed, outside
//! clicks don't dismiss the popover; an explicit `close` still does.

use crate::layout::Point;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopoverState {
    pub open: bool,

    /// Who opened the popover
    pub owner: Option<String>,

    pub anchor: Option<Point>,
    pub locked: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PopoverContext {
    inner: Arc<Mutex<PopoverState>>,
}

impl PopoverContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PopoverState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, owner: &str, anchor: Option<Point>) {
        let mut state = self.state();
        state.open = true;
        state.owner = Some(owner.to_string());
        state.anchor = anchor;
        debug!(owner, "Popover opened");
    }

    pub fn reposition(&self, anchor: Option<Point>) {
        let mut state = self.state();
        if state.open {
            state.anchor = anchor;
        }
    }

    /// Close regardless of the lock
    pub fn close(&self) {
        let mut state = self.state();
        if state.open {
            debug!(owner = ?state.owner, "Popover closed");
        }
        *state = PopoverState::default();
    }

    /// Close in response to a click outside. Returns whether it closed.
    pub fn dismiss_outside(&self) -> bool {
        if self.state().locked {
            return false;
        }
        self.close();
        true
    }

    pub fn lock(&self) {
        self.state().locked = true;
    }

    pub fn unlock(&self) {
        self.state().locked = false;
    }

    pub fn is_open(&self) -> bool {
        self.state().open
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    pub fn snapshot(&self) -> PopoverState {
        self.state().clone()
    }
}
