//! The context store: session id → lock-guarded history.
//!
//! The outer map is only locked long enough to find or insert a session's
//! handle. All history reads and writes go through the per-session mutex, so
//! append, compaction and the snapshot that feeds inference can be made atomic
//! for one session by holding a [`SessionGuard`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::compaction::{summary_request, summary_turn, CompactionPolicy, Summarizer};
use crate::error::ChatError;
use crate::types::Turn;

type Handle = Arc<Mutex<SessionState>>;

/// What the store keeps per session.
#[derive(Debug)]
struct SessionState {
    history: Vec<Turn>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionState {
    fn new() -> Self {
        let now = Utc::now();
        SessionState {
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ─────────────────────────────────────────────
// ContextStore
// ─────────────────────────────────────────────

/// Owns every session for the lifetime of the process.
///
/// Cheap to share behind an `Arc`; inject it instead of reaching for a global.
pub struct ContextStore {
    policy: CompactionPolicy,
    sessions: RwLock<HashMap<String, Handle>>,
}

impl ContextStore {
    pub fn new(policy: CompactionPolicy) -> Self {
        ContextStore {
            policy,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CompactionPolicy {
        self.policy
    }

    /// Get the session's handle, creating an empty session on first reference.
    async fn handle(&self, session_id: &str) -> Handle {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(session_id) {
                return handle.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "created session");
                Arc::new(Mutex::new(SessionState::new()))
            })
            .clone()
    }

    /// Take exclusive access to one session's history.
    ///
    /// Other sessions stay available while the guard is held.
    pub async fn lock(&self, session_id: &str) -> SessionGuard {
        let state = self.handle(session_id).await.lock_owned().await;
        SessionGuard {
            session_id: session_id.to_string(),
            state,
            policy: self.policy,
        }
    }

    /// Append a turn, creating the session if needed.
    pub async fn append(&self, session_id: &str, turn: Turn) -> Result<(), ChatError> {
        self.lock(session_id).await.append(turn)
    }

    /// Copy of the session's current history, oldest first.
    pub async fn read(&self, session_id: &str) -> Vec<Turn> {
        self.lock(session_id).await.snapshot()
    }

    /// Copy of an existing session's history. Unknown ids are not created.
    pub async fn get(&self, session_id: &str) -> Option<Vec<Turn>> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        let state = handle.lock().await;
        Some(state.history.clone())
    }

    /// Apply the compaction policy to a session. Returns whether it compacted.
    pub async fn compact_if_needed(&self, session_id: &str, summarizer: &dyn Summarizer) -> bool {
        self.lock(session_id).await.compact_if_needed(summarizer).await
    }

    /// Drop all turns of a session but keep the session itself.
    pub async fn clear(&self, session_id: &str) {
        self.lock(session_id).await.clear();
    }

    /// Forget a session entirely. Returns `true` if it existed.
    ///
    /// A request already holding the session's guard finishes against the
    /// detached history; the next reference starts a fresh session.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            debug!(session_id, "removed session");
        }
        removed
    }

    /// Number of known sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Known sessions with their turn counts, sorted by id.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let handles: Vec<(String, Handle)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .map(|(id, handle)| (id.clone(), handle.clone()))
                .collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for (session_id, handle) in handles {
            let state = handle.lock().await;
            summaries.push(SessionSummary {
                session_id,
                turns: state.history.len(),
                created_at: state.created_at,
                updated_at: state.updated_at,
            });
        }
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        summaries
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(CompactionPolicy::default())
    }
}

/// Listing entry for one session.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────
// SessionGuard
// ─────────────────────────────────────────────

/// Exclusive access to one session's history until dropped.
pub struct SessionGuard {
    session_id: String,
    state: OwnedMutexGuard<SessionState>,
    policy: CompactionPolicy,
}

impl SessionGuard {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append a turn. Turns without text are rejected.
    pub fn append(&mut self, turn: Turn) -> Result<(), ChatError> {
        if turn.is_empty() {
            return Err(ChatError::InvalidRequest(
                "cannot append a turn with empty content".into(),
            ));
        }
        self.state.history.push(turn);
        self.state.touch();
        Ok(())
    }

    /// Copy of the history; mutating it does not touch the store.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.state.history.clone()
    }

    pub fn len(&self) -> usize {
        self.state.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.state.history.clear();
        self.state.touch();
    }

    /// Fold older turns into a summary turn if the history is over the limit.
    ///
    /// On summarizer failure the history is left exactly as it was and the
    /// next over-limit append tries again.
    pub async fn compact_if_needed(&mut self, summarizer: &dyn Summarizer) -> bool {
        let len = self.state.history.len();
        let Some(cut) = self.policy.cut_index(len) else {
            return false;
        };

        let request = summary_request(&self.state.history[..cut]);
        match summarizer.summarize(&request).await {
            Ok(summary) if !summary.trim().is_empty() => {
                let mut compacted = Vec::with_capacity(len - cut + 1);
                compacted.push(summary_turn(summary.trim()));
                compacted.extend_from_slice(&self.state.history[cut..]);
                self.state.history = compacted;
                self.state.touch();
                info!(
                    session_id = %self.session_id,
                    summarized = cut,
                    kept = len - cut,
                    "compacted session history"
                );
                true
            }
            Ok(_) => {
                warn!(session_id = %self.session_id, "summary was empty, skipping compaction");
                false
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "summarization failed, skipping compaction");
                false
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
