//! Adapts an [`InferenceGateway`] into the store's [`Summarizer`].

use std::sync::Arc;

use async_trait::async_trait;
use counselor_core::{ChatError, Summarizer, Turn};
use counselor_providers::{GenerateOptions, InferenceGateway};

/// Summaries are plain text, no persona.
pub struct GatewaySummarizer {
    gateway: Arc<dyn InferenceGateway>,
    options: GenerateOptions,
}

impl GatewaySummarizer {
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        Self {
            gateway,
            options: GenerateOptions::summary(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Summarizer for GatewaySummarizer {
    async fn summarize(&self, turns: &[Turn]) -> Result<String, ChatError> {
        self.gateway.generate(turns, &self.options).await
    }
}
