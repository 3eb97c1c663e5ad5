//! Tutorial hint flags.
//!
//! Each hint key has two flags: `show` (the hint badge is visible) and
//! `show_body` (its explanation is expanded). At most one hint is shown at a
//! time; showing one hides every other.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::SnapshotStore;

/// Visibility flags of one hint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HintState {
    pub show: bool,
    pub show_body: bool,
}

/// The hints of one page, keyed by hint name in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HintBoard {
    hints: IndexMap<String, HintState>,
}

impl HintBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board with the given keys registered and hidden.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut board = Self::new();
        for key in keys {
            board.register(key);
        }
        board
    }

    /// Load the board from a store, falling back to `self` when empty.
    pub fn load_from(self, store: &dyn SnapshotStore<HintBoard>) -> Result<Self> {
        let Some(mut stored) = store.get()? else {
            return Ok(self);
        };
        for key in self.hints.into_keys() {
            stored.register(key);
        }
        Ok(stored)
    }

    pub fn save_to(&self, store: &dyn SnapshotStore<HintBoard>) -> Result<()> {
        store.set(self.clone())
    }

    /// Add a hidden hint. Existing keys keep their flags.
    pub fn register(&mut self, key: impl Into<String>) {
        self.hints.entry(key.into()).or_default();
    }

    /// Flags for `key`; unknown keys are hidden.
    pub fn state(&self, key: &str) -> HintState {
        self.hints.get(key).copied().unwrap_or_default()
    }

    /// The hint currently shown, if any.
    pub fn active(&self) -> Option<&str> {
        self.hints
            .iter()
            .find(|(_, state)| state.show)
            .map(|(key, _)| key.as_str())
    }

    /// Show `key` collapsed and hide every other hint.
    pub fn show(&mut self, key: &str) {
        self.register(key);
        for (name, state) in self.hints.iter_mut() {
            if name == key {
                state.show = true;
            } else {
                *state = HintState::default();
            }
        }
    }

    /// Expand or collapse the body of `key`. A hidden hint is shown first.
    pub fn toggle_body(&mut self, key: &str) {
        let expand = !self.state(key).show_body;
        self.show(key);
        if let Some(state) = self.hints.get_mut(key) {
            state.show_body = expand;
        }
    }

    pub fn hide(&mut self, key: &str) {
        if let Some(state) = self.hints.get_mut(key) {
            *state = HintState::default();
        }
    }

    pub fn hide_all(&mut self) {
        for state in self.hints.values_mut() {
            *state = HintState::default();
        }
    }

    /// Show the hint registered after `key`, wrapping to none at the end.
    pub fn advance(&mut self, key: &str) -> Option<&str> {
        let next = self
            .hints
            .get_index_of(key)
            .and_then(|i| self.hints.get_index(i + 1))
            .map(|(name, _)| name.clone());
        match next {
            Some(next) => {
                self.show(&next);
                self.active()
            }
            None => {
                self.hide_all();
                None
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.hints.keys().map(String::as_str)
    }
}
