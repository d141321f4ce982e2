//! Session-scoped conversation history
//!
//! History lives in buckets keyed by `(session, tool)`. A bucket starts with
//! the tool's system prompt and grows by one user/assistant pair per
//! committed exchange. Each session also owns a lock so at most one exchange
//! is in flight per session.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{RouterError, RouterResult};
use crate::types::ChatMessage;

type BucketKey = (String, String);

/// Lifecycle of one `(session, tool)` bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    /// No exchange has been committed yet (the bucket may hold its seed)
    New,
    /// At least one exchange has been committed
    Active,
}

/// In-memory history for every session
#[derive(Debug, Default)]
pub struct ConversationStore {
    buckets: RwLock<HashMap<BucketKey, Vec<ChatMessage>>>,
    session_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    history_limit: Option<usize>,
}

fn key(session_id: &str, tool: &str) -> BucketKey {
    (session_id.to_string(), tool.to_string())
}

impl ConversationStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` user/assistant turns per bucket, plus the seed
    ///
    /// The latest exchange is never trimmed, whatever the limit.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn history_limit(&self) -> Option<usize> {
        self.history_limit
    }

    /// Claim the session for one exchange
    ///
    /// Fails immediately with `SessionBusy` if the session is already
    /// claimed; the claim ends when the guard is dropped.
    pub fn try_lock_session(&self, session_id: &str) -> RouterResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.session_locks.lock();
            Arc::clone(locks.entry(session_id.to_string()).or_default())
        };
        lock.try_lock_owned()
            .map_err(|_| RouterError::SessionBusy(session_id.to_string()))
    }

    /// Insert `system_prompt` as the first turn if the bucket is empty
    ///
    /// Returns whether the bucket was seeded by this call.
    pub fn seed(&self, session_id: &str, tool: &str, system_prompt: &str) -> bool {
        let mut buckets = self.buckets.write();
        let bucket = buckets.entry(key(session_id, tool)).or_default();
        if bucket.is_empty() {
            bucket.push(ChatMessage::system(system_prompt));
            true
        } else {
            false
        }
    }

    /// Copy of the bucket's turns, oldest first
    pub fn turns(&self, session_id: &str, tool: &str) -> Vec<ChatMessage> {
        self.buckets
            .read()
            .get(&key(session_id, tool))
            .cloned()
            .unwrap_or_default()
    }

    pub fn turn_count(&self, session_id: &str, tool: &str) -> usize {
        self.buckets
            .read()
            .get(&key(session_id, tool))
            .map_or(0, Vec::len)
    }

    pub fn bucket_state(&self, session_id: &str, tool: &str) -> BucketState {
        let committed = self
            .buckets
            .read()
            .get(&key(session_id, tool))
            .is_some_and(|turns| turns.iter().any(|t| !t.is_system()));
        if committed {
            BucketState::Active
        } else {
            BucketState::New
        }
    }

    /// Append one completed exchange; returns the bucket's new turn count
    pub fn append_exchange(&self, session_id: &str, tool: &str, user: &str, assistant: &str) -> usize {
        let mut buckets = self.buckets.write();
        let bucket = buckets.entry(key(session_id, tool)).or_default();
        bucket.push(ChatMessage::user(user));
        bucket.push(ChatMessage::assistant(assistant));

        if let Some(limit) = self.history_limit {
            trim_bucket(bucket, limit);
        }
        bucket.len()
    }

    /// Drop every bucket of `session_id`; returns how many were removed
    ///
    /// The session's lock goes too unless an exchange still holds it.
    pub fn clear_session(&self, session_id: &str) -> usize {
        {
            let mut locks = self.session_locks.lock();
            // Guards own a clone, so a lone reference means nobody holds it
            if locks.get(session_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(session_id);
            }
        }

        let mut buckets = self.buckets.write();
        let before = buckets.len();
        buckets.retain(|(session, _), _| session != session_id);
        before - buckets.len()
    }

    /// Sessions with a lock entry, claimed or not
    pub fn locked_sessions(&self) -> usize {
        self.session_locks.lock().len()
    }

    /// Sessions with at least one bucket, sorted
    pub fn sessions(&self) -> Vec<String> {
        let mut sessions: Vec<String> = self
            .buckets
            .read()
            .keys()
            .map(|(session, _)| session.clone())
            .collect();
        sessions.sort();
        sessions.dedup();
        sessions
    }

    /// Tools that have a bucket in `session_id`, sorted
    pub fn tools_for(&self, session_id: &str) -> Vec<String> {
        let mut tools: Vec<String> = self
            .buckets
            .read()
            .keys()
            .filter(|(session, _)| session == session_id)
            .map(|(_, tool)| tool.clone())
            .collect();
        tools.sort();
        tools
    }
}

/// Drop the oldest exchanges until at most `limit` non-system turns remain
///
/// The newest pair always survives, so limits below 2 keep exactly one
/// exchange.
fn trim_bucket(bucket: &mut Vec<ChatMessage>, limit: usize) {
    let start = bucket.iter().take_while(|t| t.is_system()).count();
    let turns = bucket.len() - start;
    let excess = turns.saturating_sub(limit);
    // Whole pairs only, so user/assistant alternation is preserved
    let drop = (excess + excess % 2).min(turns.saturating_sub(2));
    bucket.drain(start..start + drop);
}
