//! Counselor agent — everything between an incoming chat request and the
//! context store.
//!
//! This crate contains:
//! - **extractor**: PDF attachments to text, through a scoped temporary file
//! - **composer**: builds the user turn, optionally grounded in a document
//! - **summarizer**: compaction summaries through the inference gateway
//! - **persona**: the counselor system instruction
//! - **orchestrator**: runs one request through all of the above

pub mod composer;
pub mod extractor;
pub mod orchestrator;
pub mod persona;
pub mod summarizer;

pub use composer::compose_user_turn;
pub use extractor::{AttachmentExtractor, DocumentParser, PdfParser};
pub use orchestrator::{
    Attachment, ChatFailure, ChatOutcome, ChatRequest, OrchestratorSettings, SessionOrchestrator,
    Stage,
};
pub use persona::{load_persona, DEFAULT_PERSONA};
pub use summarizer::GatewaySummarizer;
