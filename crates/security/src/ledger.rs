//! Abuse ledger: per-session violation counters with an audit trail.
//!
//! Counters only ever go up. Memory stays bounded: when a new session would
//! exceed the configured capacity, the least recently active session is
//! forgotten, preferring sessions that are not locked out.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit records kept per session; older ones are dropped first.
const TRAIL_CAPACITY: usize = 16;

/// One recorded honeypot hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub session_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Session hit count including this one.
    pub hits: u32,
}

/// Where hit records are written besides the ledger itself.
pub trait AuditSink: Send + Sync {
    fn record(&self, hit: &HitRecord);
}

/// Logs each hit with `tracing::warn!` under the `audit` target.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, hit: &HitRecord) {
        tracing::warn!(
            target: "audit",
            session_id = %hit.session_id,
            hits = hit.hits,
            message = %hit.message,
            "HONEYPOT"
        );
    }
}

/// Counts abuse hits per session.
pub trait AbuseLedger: Send + Sync {
    /// Record a hit and return the session's count after the increment.
    fn record_hit(&self, session_id: &str, message: &str) -> u32;

    /// Hits recorded so far for a session (0 if unknown).
    fn hit_count(&self, session_id: &str) -> u32;
}

struct SessionRecord {
    hits: u32,
    trail: VecDeque<HitRecord>,
    last_active: u64,
}

#[derive(Default)]
struct LedgerState {
    sessions: HashMap<String, SessionRecord>,
    clock: u64,
}

/// In-memory [`AbuseLedger`]. All updates happen under one lock, so
/// concurrent hits on the same session are never lost.
pub struct SessionLedger {
    state: Mutex<LedgerState>,
    max_sessions: usize,
    lockout_threshold: u32,
    sinks: Vec<Box<dyn AuditSink>>,
}

impl std::fmt::Debug for SessionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLedger")
            .field("tracked_sessions", &self.tracked_sessions())
            .field("max_sessions", &self.max_sessions)
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl SessionLedger {
    pub fn new(max_sessions: usize, lockout_threshold: u32) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            max_sessions: max_sessions.max(1),
            lockout_threshold,
            sinks: Vec::new(),
        }
    }

    pub fn with_sinks(mut self, sinks: Vec<Box<dyn AuditSink>>) -> Self {
        self.sinks = sinks;
        self
    }

    /// Audit trail for a session, oldest first.
    pub fn trail(&self, session_id: &str) -> Vec<HitRecord> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .sessions
            .get(session_id)
            .map(|s| s.trail.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn tracked_sessions(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sessions
            .len()
    }

    fn evict_one(&self, state: &mut LedgerState) {
        let victim = state
            .sessions
            .iter()
            .min_by_key(|(_, s)| (s.hits >= self.lockout_threshold, s.last_active))
            .map(|(id, _)| id.clone());
        if let Some(id) = victim {
            tracing::debug!(session_id = %id, "Evicting idle session from abuse ledger");
            state.sessions.remove(&id);
        }
    }
}

impl AbuseLedger for SessionLedger {
    fn record_hit(&self, session_id: &str, message: &str) -> u32 {
        let record = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.clock += 1;
            let now = state.clock;

            if !state.sessions.contains_key(session_id)
                && state.sessions.len() >= self.max_sessions
            {
                self.evict_one(&mut state);
            }

            let session = state
                .sessions
                .entry(session_id.to_string())
                .or_insert_with(|| SessionRecord {
                    hits: 0,
                    trail: VecDeque::new(),
                    last_active: now,
                });

            session.hits = session.hits.saturating_add(1);
            session.last_active = now;

            let record = HitRecord {
                session_id: session_id.to_string(),
                message: message.to_string(),
                timestamp: Utc::now(),
                hits: session.hits,
            };
            if session.trail.len() == TRAIL_CAPACITY {
                session.trail.pop_front();
            }
            session.trail.push_back(record.clone());
            record
        };

        for sink in &self.sinks {
            sink.record(&record);
        }
        record.hits
    }

    fn hit_count(&self, session_id: &str) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.sessions.get(session_id).map_or(0, |s| s.hits)
    }
}
