//! Single-writer store container.
//!
//! [`Store`] owns the current [`StoreState`], applies dispatched actions
//! through a [`StoreReducer`], and tells subscribers about each resulting
//! state. A batch is one dispatch, so subscribers never see the states
//! between its operations.

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use crate::reducer::{Action, StoreReducer};
use crate::state::StoreState;

/// Configuration for a [`Store`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of previous states retained for [`Store::undo`].
    pub history_size: usize,
    /// Notify subscribers even when a dispatch leaves the state unchanged.
    pub notify_unchanged: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_size: 32,
            notify_unchanged: false,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration that keeps no history.
    #[must_use]
    pub fn without_history() -> Self {
        Self {
            history_size: 0,
            ..Self::default()
        }
    }

    /// Builder method to set the history size.
    #[must_use]
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Builder method to set `notify_unchanged`.
    #[must_use]
    pub fn with_notify_unchanged(mut self, notify: bool) -> Self {
        self.notify_unchanged = notify;
        self
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreState)>;

/// Holds the current state and serializes every transition.
pub struct Store {
    reducer: StoreReducer,
    config: StoreConfig,
    state: StoreState,
    history: VecDeque<StoreState>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    /// Creates a store starting from the reducer's initial state.
    #[must_use]
    pub fn new(reducer: StoreReducer, config: StoreConfig) -> Self {
        let state = reducer.initial_state();
        Self {
            reducer,
            config,
            state,
            history: VecDeque::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Returns the reducer.
    #[must_use]
    pub fn reducer(&self) -> &StoreReducer {
        &self.reducer
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Applies an action as one transition and notifies subscribers once.
    pub fn dispatch(&mut self, action: impl Into<Action>) -> &StoreState {
        let action = action.into();
        let next = self.reducer.reduce(&self.state, &action);
        let changed = !next.ptr_eq(&self.state);
        debug!(changed, records = next.record_count(), "dispatched action");

        if changed {
            let previous = std::mem::replace(&mut self.state, next);
            self.remember(previous);
        }
        if changed || self.config.notify_unchanged {
            for (_, listener) in &mut self.listeners {
                listener(&self.state);
            }
        }
        &self.state
    }

    /// Registers a callback invoked after every state-changing dispatch.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Returns the state before the last change, if retained.
    #[must_use]
    pub fn previous(&self) -> Option<&StoreState> {
        self.history.back()
    }

    /// Returns the number of retained previous states.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Restores the previous state and notifies subscribers.
    ///
    /// Returns false if there is no retained history.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop_back() else {
            return false;
        };
        self.state = previous;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        true
    }

    fn remember(&mut self, state: StoreState) {
        if self.config.history_size == 0 {
            return;
        }
        if self.history.len() == self.config.history_size {
            self.history.pop_front();
        }
        self.history.push_back(state);
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
