//! Per-session turn history kept by the HTTP adapter.
//!
//! The engine itself is stateless with respect to history; the gateway owns
//! it so browser clients only need to send the new message.

use std::collections::{HashMap, VecDeque};

use parley_core::message::Turn;
use tracing::debug;

/// Turns kept per session (seven exchanges).
pub const MAX_TURNS: usize = 14;

struct SessionHistory {
    turns: VecDeque<Turn>,
    /// Value of `Inner::clock` at the last write.
    last_active: u64,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionHistory>,
    clock: u64,
}

/// Bounded map of session id to recent turns.
///
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly). When more
/// than `max_sessions` are tracked the least recently active one is dropped.
pub struct SessionHistories {
    max_turns: usize,
    max_sessions: usize,
    inner: std::sync::Mutex<Inner>,
}

impl SessionHistories {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            max_turns,
            max_sessions,
            inner: std::sync::Mutex::new(Inner::default()),
        }
    }

    /// Copy of the session's turns, oldest first.
    pub fn snapshot(&self, session_id: &str) -> Vec<Turn> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .sessions
            .get(session_id)
            .map(|s| s.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append one user/assistant exchange.
    pub fn record(&self, session_id: &str, user: &str, assistant: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.clock += 1;
        let now = inner.clock;
        let sessions = &mut inner.sessions;

        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_active)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                debug!(evicted = %id, "Dropping idle session history");
                sessions.remove(&id);
            }
        }

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionHistory {
                turns: VecDeque::new(),
                last_active: now,
            });
        entry.turns.push_back(Turn::user(user));
        entry.turns.push_back(Turn::assistant(assistant));
        while entry.turns.len() > self.max_turns {
            entry.turns.pop_front();
        }
        entry.last_active = now;
    }

    /// Forget a session's turns. Returns whether anything was stored.
    pub fn clear(&self, session_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sessions
            .remove(session_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sessions
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_turns_in_order() {
        let histories = SessionHistories::new(MAX_TURNS, 10);
        for i in 0..10 {
            histories.record("s", &format!("q{i}"), &format!("a{i}"));
        }
        let turns = histories.snapshot("s");
        assert_eq!(turns.len(), MAX_TURNS);
        assert_eq!(turns[0], Turn::user("q3"));
        assert_eq!(turns[13], Turn::assistant("a9"));
    }

    #[test]
    fn unknown_session_is_empty() {
        let histories = SessionHistories::new(MAX_TURNS, 10);
        assert!(histories.snapshot("nobody").is_empty());
        assert!(!histories.clear("nobody"));
    }

    #[test]
    fn clear_forgets_only_that_session() {
        let histories = SessionHistories::new(MAX_TURNS, 10);
        histories.record("a", "q", "r");
        histories.record("b", "q", "r");
        assert!(histories.clear("a"));
        assert!(histories.snapshot("a").is_empty());
        assert_eq!(histories.snapshot("b").len(), 2);
    }

    #[test]
    fn evicts_least_recently_active_at_capacity() {
        let histories = SessionHistories::new(MAX_TURNS, 2);
        histories.record("old", "q", "r");
        histories.record("new", "q", "r");
        histories.record("old", "q2", "r2");
        histories.record("third", "q", "r");

        assert_eq!(histories.len(), 2);
        assert!(histories.snapshot("new").is_empty());
        assert_eq!(histories.snapshot("old").len(), 4);
    }
}
