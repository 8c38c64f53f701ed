//! Session context store — in-memory, per-session history with
//! summarization-based compaction.
//!
//! History lives only for the life of the process. Each session has its own
//! lock, so work on one session never waits on another.

pub mod compaction;
pub mod store;

pub use compaction::{CompactionPolicy, PolicyError, Summarizer, SUMMARY_INSTRUCTION, SUMMARY_PREFIX};
pub use store::{ContextStore, SessionGuard, SessionSummary};
