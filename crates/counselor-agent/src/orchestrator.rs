//! Session orchestrator — runs one chat request end to end.
//!
//! `Received → AttachmentExtracted? → TurnComposed → Appended → Compacted? →
//! Inferred → ReplyAppended → Completed`, or `Failed(kind)` from any stage.
//! Nothing is rolled back: a user turn that was appended stays appended even
//! if inference fails or the deadline expires. A failed request returns its
//! trace, so the caller can tell how far it got.

use std::sync::Arc;
use std::time::Duration;

use counselor_core::config::Config;
use counselor_core::{ChatError, ContextStore, ErrorKind, Summarizer};
use counselor_providers::{GenerateOptions, InferenceGateway};
use tracing::{debug, info, warn};

use crate::composer::compose_user_turn;
use crate::extractor::AttachmentExtractor;
use crate::summarizer::GatewaySummarizer;

// ─────────────────────────────────────────────
// Request / outcome types
// ─────────────────────────────────────────────

/// Progress of a request through the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Received,
    AttachmentExtracted,
    TurnComposed,
    Appended,
    Compacted,
    Inferred,
    ReplyAppended,
    Completed,
    Failed(ErrorKind),
}

/// An uploaded document.
#[derive(Clone, Debug)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    pub user_query: String,
    /// Missing or empty selects the fallback session.
    pub session_id: Option<String>,
    pub attachment: Option<Attachment>,
}

impl ChatRequest {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_attachment(mut self, bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        self.attachment = Some(Attachment {
            bytes,
            filename: filename.into(),
        });
        self
    }
}

#[derive(Clone, Debug)]
pub struct ChatOutcome {
    /// Model reply, passed through unparsed.
    pub reply: String,
    /// The session the request ran against.
    pub session_id: String,
    /// History length after the reply was appended.
    pub history_len: usize,
    pub trace: Vec<Stage>,
}

/// A failed request: the error plus the stages it passed through, ending in
/// `Stage::Failed`.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ChatFailure {
    pub error: ChatError,
    pub trace: Vec<Stage>,
}

impl ChatFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// The last stage completed before the failure.
    pub fn reached(&self) -> Stage {
        self.trace
            .iter()
            .rev()
            .find(|stage| !matches!(stage, Stage::Failed(_)))
            .copied()
            .unwrap_or(Stage::Received)
    }

    pub fn into_error(self) -> ChatError {
        self.error
    }
}

// ─────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct OrchestratorSettings {
    pub fallback_session_id: String,
    /// Whole-request deadline. `None` waits as long as the provider does.
    pub deadline: Option<Duration>,
    pub reply_options: GenerateOptions,
    /// Options for compaction summaries. No persona, plain text.
    pub summary_options: GenerateOptions,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config, persona: String) -> Self {
        Self {
            fallback_session_id: config.chat.fallback_session_id.clone(),
            deadline: config.chat.request_timeout_secs.map(Duration::from_secs),
            reply_options: GenerateOptions::reply(persona)
                .with_limits(config.model.max_tokens, config.model.temperature),
            summary_options: GenerateOptions::summary()
                .with_limits(config.model.max_tokens, config.model.temperature),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            fallback_session_id: "default-session".to_string(),
            deadline: None,
            reply_options: GenerateOptions::reply(crate::persona::DEFAULT_PERSONA),
            summary_options: GenerateOptions::summary(),
        }
    }
}

// ─────────────────────────────────────────────
// SessionOrchestrator
// ─────────────────────────────────────────────

pub struct SessionOrchestrator {
    store: Arc<ContextStore>,
    gateway: Arc<dyn InferenceGateway>,
    summarizer: Arc<dyn Summarizer>,
    extractor: AttachmentExtractor,
    settings: OrchestratorSettings,
}

impl SessionOrchestrator {
    /// Summaries go through the same gateway as replies, with
    /// `settings.summary_options`.
    pub fn new(
        store: Arc<ContextStore>,
        gateway: Arc<dyn InferenceGateway>,
        extractor: AttachmentExtractor,
        settings: OrchestratorSettings,
    ) -> Self {
        let summarizer = Arc::new(
            GatewaySummarizer::new(Arc::clone(&gateway))
                .with_options(settings.summary_options.clone()),
        );
        Self {
            store,
            gateway,
            summarizer,
            extractor,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn InferenceGateway> {
        &self.gateway
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn max_attachment_bytes(&self) -> usize {
        self.extractor.max_bytes()
    }

    /// Map a missing, empty or all-whitespace session id to the fallback
    /// session. Any other id is an opaque key and is used as given.
    pub fn resolve_session_id(&self, requested: Option<&str>) -> String {
        match requested {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => self.settings.fallback_session_id.clone(),
        }
    }

    /// Handle one chat request.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatOutcome, ChatFailure> {
        let session_id = self.resolve_session_id(request.session_id.as_deref());
        let mut trace = Trace::new(&session_id);

        // The trace lives outside the timed future so a deadline keeps it.
        let result = match self.settings.deadline {
            Some(limit) => tokio::time::timeout(limit, self.process(&session_id, request, &mut trace))
                .await
                .unwrap_or(Err(ChatError::DeadlineExceeded(limit))),
            None => self.process(&session_id, request, &mut trace).await,
        };

        match result {
            Ok((reply, history_len)) => {
                let trace = trace.into_stages();
                Ok(ChatOutcome {
                    reply,
                    session_id,
                    history_len,
                    trace,
                })
            }
            Err(error) => {
                trace.enter(Stage::Failed(error.kind()));
                let trace = trace.into_stages();
                warn!(
                    session_id = %session_id,
                    stages = ?trace,
                    error = %error,
                    "chat request failed"
                );
                Err(ChatFailure { error, trace })
            }
        }
    }

    /// Returns the reply and the history length after it was appended.
    async fn process(
        &self,
        session_id: &str,
        request: ChatRequest,
        trace: &mut Trace<'_>,
    ) -> Result<(String, usize), ChatError> {
        trace.enter(Stage::Received);

        if request.user_query.trim().is_empty() {
            return Err(ChatError::InvalidRequest("Message is required".into()));
        }

        let extracted = match request.attachment {
            Some(attachment) => {
                let text = self
                    .extractor
                    .extract(attachment.bytes, &attachment.filename)
                    .await?;
                trace.enter(Stage::AttachmentExtracted);
                Some(text)
            }
            None => None,
        };

        let user_turn = compose_user_turn(&request.user_query, extracted.as_deref())?;
        trace.enter(Stage::TurnComposed);

        // Append, compaction and the snapshot for inference are atomic per session.
        let snapshot = {
            let mut guard = self.store.lock(session_id).await;
            guard.append(user_turn)?;
            trace.enter(Stage::Appended);

            if guard.compact_if_needed(self.summarizer.as_ref()).await {
                trace.enter(Stage::Compacted);
            }
            guard.snapshot()
        };

        debug!(
            session_id = %session_id,
            turns = snapshot.len(),
            provider = self.gateway.display_name(),
            model = self.gateway.model(),
            "requesting reply"
        );
        let reply = self
            .gateway
            .generate(&snapshot, &self.settings.reply_options)
            .await?;
        trace.enter(Stage::Inferred);

        let history_len = {
            let mut guard = self.store.lock(session_id).await;
            guard.append(counselor_core::Turn::model(reply.as_str()))?;
            guard.len()
        };
        trace.enter(Stage::ReplyAppended);
        trace.enter(Stage::Completed);

        info!(session_id = %session_id, history_len, "chat request completed");

        Ok((reply, history_len))
    }
}

/// Records stage transitions and logs each one.
struct Trace<'a> {
    session_id: &'a str,
    stages: Vec<Stage>,
}

impl<'a> Trace<'a> {
    fn new(session_id: &'a str) -> Self {
        Self {
            session_id,
            stages: Vec::with_capacity(8),
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!(session_id = %self.session_id, stage = ?stage, "stage");
        self.stages.push(stage);
    }

    fn into_stages(self) -> Vec<Stage> {
        self.stages
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
