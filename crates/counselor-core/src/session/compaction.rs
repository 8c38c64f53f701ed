//! Compaction policy: when a history is too long, fold the older turns into a
//! single synthetic summary turn.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{Role, Turn};

/// Tag that marks a summary turn as injected by the system rather than typed
/// by the user.
pub const SUMMARY_PREFIX: &str = "[SYSTEM SUMMARY of previous conversation]: ";

/// Instruction appended after the older turns when asking for a summary.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the following conversation history. \
Focus on the user's key problems, emotional state, and the advice given so far. Keep it concise.";

/// Produces the summary text for a run of older turns.
///
/// `turns` already ends with the summary instruction turn. Implementations
/// must not retry internally; a failed summary just skips compaction.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, turns: &[Turn]) -> Result<String, ChatError>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("keepRecent ({keep_recent}) must be at least 1 and smaller than maxHistoryLength ({max_len})")]
    InvalidBounds { max_len: usize, keep_recent: usize },
}

/// Bounds for a session's history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactionPolicy {
    max_len: usize,
    keep_recent: usize,
}

impl CompactionPolicy {
    pub const DEFAULT_MAX_LEN: usize = 10;
    pub const DEFAULT_KEEP_RECENT: usize = 4;

    /// Requires `0 < keep_recent < max_len`.
    pub fn new(max_len: usize, keep_recent: usize) -> Result<Self, PolicyError> {
        if keep_recent == 0 || keep_recent >= max_len {
            return Err(PolicyError::InvalidBounds {
                max_len,
                keep_recent,
            });
        }
        Ok(Self {
            max_len,
            keep_recent,
        })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn keep_recent(&self) -> usize {
        self.keep_recent
    }

    /// Where to split a history of `len` turns, or `None` if it is within bounds.
    ///
    /// Turns before the cut are summarized, turns from the cut on are kept.
    pub fn cut_index(&self, len: usize) -> Option<usize> {
        (len > self.max_len).then(|| len - self.keep_recent)
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_len: Self::DEFAULT_MAX_LEN,
            keep_recent: Self::DEFAULT_KEEP_RECENT,
        }
    }
}

/// Turns sent to the summarizer: the older turns followed by the instruction.
pub fn summary_request(older: &[Turn]) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(older.len() + 1);
    turns.extend_from_slice(older);
    turns.push(Turn::user(SUMMARY_INSTRUCTION));
    turns
}

/// The synthetic turn that replaces the summarized turns.
pub fn summary_turn(summary: &str) -> Turn {
    Turn::new(Role::User, format!("{SUMMARY_PREFIX}{summary}"))
}

/// Whether a turn was produced by compaction.
pub fn is_summary_turn(turn: &Turn) -> bool {
    turn.role() == Role::User && turn.text().starts_with(SUMMARY_PREFIX)
}
