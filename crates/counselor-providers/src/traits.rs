//! Inference gateway trait — the narrow interface to the language model.
//!
//! Replies and compaction summaries go through the same call; only the
//! [`GenerateOptions`] differ.

use async_trait::async_trait;
use counselor_core::{ChatError, Turn};

/// Options for one `generate` call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateOptions {
    /// Persona / system instruction sent ahead of the turns.
    pub system_instruction: Option<String>,
    /// Ask the model for a JSON object instead of free text.
    pub json_response: bool,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            system_instruction: None,
            json_response: false,
            max_tokens: 8192,
            temperature: 0.7,
        }
    }
}

impl GenerateOptions {
    /// Options for a persona reply: system instruction + JSON output.
    pub fn reply(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: Some(system_instruction.into()),
            json_response: true,
            ..Default::default()
        }
    }

    /// Options for a plain-text summary.
    pub fn summary() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f64) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// Anything that can turn a sequence of turns into model text.
///
/// Fails with [`ChatError::InferenceUnavailable`] on any transport or remote
/// error. Never retries; retry policy belongs to the caller. `turns` is
/// read-only.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn generate(&self, turns: &[Turn], options: &GenerateOptions) -> Result<String, ChatError>;

    /// The model this gateway talks to.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
