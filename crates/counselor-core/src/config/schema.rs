//! Configuration schema.
//!
//! Hierarchy: `Config` → `ModelConfig`, `ProvidersConfig`, `ContextConfig`,
//! `ChatConfig`, `AttachmentsConfig`, `GatewayConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::session::{CompactionPolicy, PolicyError};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.counselor/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub model: ModelConfig,
    pub providers: ProvidersConfig,
    pub context: ContextConfig,
    pub chat: ChatConfig,
    pub attachments: AttachmentsConfig,
    pub gateway: GatewayConfig,
}

// ─────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────

/// Which model answers, and how.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Model identifier, matched against the provider registry.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 8192,
            temperature: 0.7,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// One `ProviderConfig` per supported backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub groq: ProviderConfig,
    pub vllm: ProviderConfig,
}

impl ProvidersConfig {
    fn entries(&self) -> [(&'static str, &ProviderConfig); 6] {
        [
            ("gemini", &self.gemini),
            ("openai", &self.openai),
            ("openrouter", &self.openrouter),
            ("deepseek", &self.deepseek),
            ("groq", &self.groq),
            ("vllm", &self.vllm),
        ]
    }

    /// Get a provider config by name (e.g. `"gemini"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        self.entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    /// Convert to a map for use with the provider registry.
    pub fn to_map(&self) -> HashMap<String, ProviderConfig> {
        self.entries()
            .into_iter()
            .map(|(name, config)| (name.to_string(), config.clone()))
            .collect()
    }
}

// ─────────────────────────────────────────────
// Context (compaction bounds)
// ─────────────────────────────────────────────

/// History bounds per session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConfig {
    /// Compaction fires once a history grows past this many turns.
    pub max_history_length: usize,
    /// Newest turns kept verbatim when compacting.
    pub keep_recent: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_history_length: CompactionPolicy::DEFAULT_MAX_LEN,
            keep_recent: CompactionPolicy::DEFAULT_KEEP_RECENT,
        }
    }
}

impl ContextConfig {
    pub fn policy(&self) -> Result<CompactionPolicy, PolicyError> {
        CompactionPolicy::new(self.max_history_length, self.keep_recent)
    }
}

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

/// Per-request chat behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Session used when a request carries no session id.
    pub fallback_session_id: String,
    /// Deadline for a whole chat request, in seconds. Unset means no deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// File whose contents replace the built-in counselor persona.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction_file: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            fallback_session_id: "default-session".to_string(),
            request_timeout_secs: None,
            system_instruction_file: None,
        }
    }
}

// ─────────────────────────────────────────────
// Attachments
// ─────────────────────────────────────────────

/// Document upload handling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachmentsConfig {
    /// Where temporary upload files are written. Defaults to the OS temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
    /// Largest accepted upload, in bytes.
    pub max_bytes: usize,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// HTTP gateway listen address.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
