//! Counselor core — turn types, error taxonomy, configuration, and the
//! session context store with its compaction policy.

pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod utils;

pub use error::{ChatError, ErrorKind};
pub use session::{CompactionPolicy, ContextStore, SessionGuard, Summarizer};
pub use types::{Part, Role, Turn};
