//! Per-call conversation history.
//!
//! The store maps a carrier-assigned call SID to the ordered turns spoken so
//! far in that call. History is bounded to the most recent
//! [`MAX_HISTORY_TURNS`] turns, enforced on both read and write so an
//! over-length entry can never leak back out. Entries are evicted after a
//! configurable idle period since calls that drop without a goodbye never
//! send a cleanup signal.
//!
//! Concurrent respond callbacks for the same call can interleave: both may
//! read the same history and the later `update` wins, dropping one exchange.
//! That window is accepted; the store only guarantees that each individual
//! operation observes a consistent map.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Maximum turns retained per conversation; older turns are discarded first.
pub const MAX_HISTORY_TURNS: usize = 12;

/// Speaker of a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance within a call, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Truncate a history to the retention window, keeping the newest turns and
/// preserving their relative order.
pub fn ensure_window(mut turns: Vec<Turn>) -> Vec<Turn> {
    if turns.len() > MAX_HISTORY_TURNS {
        turns.drain(..turns.len() - MAX_HISTORY_TURNS);
    }
    turns
}

struct Entry {
    turns: Vec<Turn>,
    last_activity: Instant,
}

/// Process-wide mapping from call SID to conversation history
///
/// Interior mutability via a mutex-guarded map; shared through `Arc<AppState>`
/// rather than ambient globals so the lifecycle is visible at the type level.
pub struct ConversationStore {
    entries: Mutex<HashMap<String, Entry>>,
    idle_ttl: Option<Duration>,
}

impl ConversationStore {
    /// Create a store; `idle_ttl` of `None` disables eviction entirely.
    pub fn new(idle_ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        match self.idle_ttl {
            Some(ttl) => entry.last_activity.elapsed() > ttl,
            None => false,
        }
    }

    /// Stored turns for a call, or empty if none exist. Never fails.
    ///
    /// Enforces the retention window on read and drops the entry if it has
    /// been idle past the TTL. Reading does not refresh the idle clock.
    pub fn get(&self, call_sid: &str) -> Vec<Turn> {
        let mut entries = self.entries.lock();
        match entries.get(call_sid) {
            Some(entry) if self.is_expired(entry) => {
                entries.remove(call_sid);
                Vec::new()
            }
            Some(entry) => ensure_window(entry.turns.clone()),
            None => Vec::new(),
        }
    }

    /// Replace the stored history for a call in full. Never fails.
    ///
    /// Truncates to the retention window before storing and refreshes the
    /// entry's idle clock.
    pub fn update(&self, call_sid: &str, turns: Vec<Turn>) {
        let mut entries = self.entries.lock();
        entries.insert(
            call_sid.to_string(),
            Entry {
                turns: ensure_window(turns),
                last_activity: Instant::now(),
            },
        );
    }

    /// Remove the history for a call. Idempotent no-op if absent.
    pub fn clear(&self, call_sid: &str) {
        self.entries.lock().remove(call_sid);
    }

    /// Whether a live (non-expired) entry exists for this call
    pub fn contains(&self, call_sid: &str) -> bool {
        let entries = self.entries.lock();
        entries
            .get(call_sid)
            .is_some_and(|entry| !self.is_expired(entry))
    }

    /// Number of tracked conversations, including any not yet swept
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry idle past the TTL; returns how many were removed.
    /// Called periodically by the background sweep task.
    pub fn evict_idle(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        match self.idle_ttl {
            Some(ttl) => entries.retain(|_, entry| entry.last_activity.elapsed() <= ttl),
            None => return 0,
        }
        before - entries.len()
    }
}
