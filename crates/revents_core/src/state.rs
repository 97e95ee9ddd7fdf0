//! Application state store fed by domain operations.
//!
//! # Responsibility
//! - Hold the async-operation status and the last fetched dashboard page.
//! - Apply `AppAction`s through one reducer.
//!
//! # Invariants
//! - `FeedFetched` replaces the current page; it never appends.
//! - Only domain services dispatch; readers get cloned snapshots.

use crate::model::event::Event;
use log::trace;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

const RECENT_ACTIONS_CAPACITY: usize = 64;

/// Status of the async operation family tracked by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AsyncStatus {
    #[default]
    Idle,
    InFlight,
    Failed(String),
}

/// State transitions emitted by domain operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    AsyncStart,
    AsyncEnd,
    AsyncError(String),
    FeedFetched { events: Vec<Event> },
}

impl AppAction {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AsyncStart => "async_start",
            Self::AsyncEnd => "async_end",
            Self::AsyncError(_) => "async_error",
            Self::FeedFetched { .. } => "feed_fetched",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub status: AsyncStatus,
    /// Last fetched dashboard page.
    pub events: Vec<Event>,
}

impl AppState {
    pub fn reduce(&mut self, action: &AppAction) {
        match action {
            AppAction::AsyncStart => self.status = AsyncStatus::InFlight,
            AppAction::AsyncEnd => self.status = AsyncStatus::Idle,
            AppAction::AsyncError(message) => self.status = AsyncStatus::Failed(message.clone()),
            AppAction::FeedFetched { events } => self.events = events.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == AsyncStatus::InFlight
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    state: AppState,
    recent: VecDeque<AppAction>,
}

/// Thread-safe container for `AppState`.
#[derive(Debug, Default)]
pub struct AppStore {
    inner: Mutex<StoreInner>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: AppAction) {
        trace!("event=state_dispatch module=state action={}", action.name());
        let mut inner = self.lock();
        inner.state.reduce(&action);
        if inner.recent.len() == RECENT_ACTIONS_CAPACITY {
            inner.recent.pop_front();
        }
        inner.recent.push_back(action);
    }

    pub fn snapshot(&self) -> AppState {
        self.lock().state.clone()
    }

    pub fn status(&self) -> AsyncStatus {
        self.lock().state.status.clone()
    }

    /// Most recent actions, oldest first (bounded).
    pub fn recent_actions(&self) -> Vec<AppAction> {
        self.lock().recent.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // State is replaced wholesale by the reducer, so a poisoned lock still
        // holds a consistent value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
