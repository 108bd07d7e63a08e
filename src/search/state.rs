//! Shared search result state.
//!
//! The UI needs one search state that every component observes, without
//! hidden module-level globals: an explicit store object is constructed once
//! at application start and passed by reference. `full` distinguishes "no
//! search active" (`None`) from "search active, zero hits" (`Some(empty)`);
//! the UI must render those differently.

use std::sync::{Mutex, MutexGuard};

use super::SearchHit;

/// Snapshot of both result sets.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Type-ahead results; empty when nothing is typed or nothing matches.
    pub quick: Vec<SearchHit>,
    /// Full search results; `None` until a search is explicitly run.
    pub full: Option<Vec<SearchHit>>,
}

type Listener = Box<dyn Fn(&SearchState) + Send + Sync>;

/// Observable store over [`SearchState`].
#[derive(Default)]
pub struct SearchStore {
    state: Mutex<SearchState>,
    listeners: Mutex<Vec<(usize, Listener)>>,
    next_listener_id: Mutex<usize>,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener called after every state change. Returns an id
    /// for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, listener: Listener) -> usize {
        let mut next = self.next_listener_id.lock().unwrap_or_else(|e| e.into_inner());
        let id = *next;
        *next += 1;
        drop(next);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: usize) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(lid, _)| *lid != id);
    }

    fn lock_state(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for (_, listener) in self.listeners.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            listener(&snapshot);
        }
    }

    pub fn snapshot(&self) -> SearchState {
        self.lock_state().clone()
    }

    pub fn set_quick(&self, hits: Vec<SearchHit>) {
        self.lock_state().quick = hits;
        self.notify();
    }

    pub fn set_full(&self, hits: Vec<SearchHit>) {
        self.lock_state().full = Some(hits);
        self.notify();
    }

    /// Reset both result sets to the "no search active" state.
    pub fn clear(&self) {
        {
            let mut state = self.lock_state();
            state.quick = Vec::new();
            state.full = None;
        }
        self.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            id: title.to_string(),
            title: title.to_string(),
            date: "2025-01-01".to_string(),
            tags: Vec::new(),
            snippet: String::new(),
            score: 1.0,
        }
    }

    #[test]
    fn test_clear_is_distinct_from_zero_hits() {
        let store = SearchStore::new();
        assert!(store.snapshot().full.is_none());

        store.set_full(Vec::new());
        let full = store.snapshot().full;
        assert!(matches!(full, Some(ref v) if v.is_empty()));

        store.clear();
        assert!(store.snapshot().full.is_none());
        assert!(store.snapshot().quick.is_empty());
    }

    #[test]
    fn test_listeners_see_every_change() {
        let store = SearchStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.subscribe(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        store.set_quick(vec![hit("a")]);
        store.set_full(vec![hit("b")]);
        store.clear();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = SearchStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = store.subscribe(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        store.unsubscribe(id);
        store.set_quick(vec![hit("a")]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
