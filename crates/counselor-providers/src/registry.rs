//! Provider registry — static specs for the supported OpenAI-compatible backends.
//!
//! Each `ProviderSpec` describes how to reach one provider: keywords for model
//! matching, the default API base, and how the model name must be rewritten.

use std::collections::HashMap;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, also the key in the `providers` config section.
    pub name: &'static str,
    /// Keywords to match in model names (lowercase).
    pub keywords: &'static [&'static str],
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Gateways route any model and are used as fallback.
    pub is_gateway: bool,
    /// Self-hosted endpoints; also fallback only.
    pub is_local: bool,
    /// If the API key starts with this prefix, auto-detect this provider.
    pub detect_by_key_prefix: Option<&'static str>,
    /// If the API base URL contains this substring, auto-detect.
    pub detect_by_base_keyword: Option<&'static str>,
    /// Default API base URL, used when the config sets none.
    pub default_api_base: Option<&'static str>,
    /// Direct providers want the bare model id: `"google/gemini-2.5-flash"`
    /// is sent as `"gemini-2.5-flash"`.
    pub strip_model_prefix: bool,
}

/// Supported providers, in matching priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // OpenRouter — gateway, matched by key prefix "sk-or-"
    ProviderSpec {
        name: "openrouter",
        keywords: &["openrouter"],
        display_name: "OpenRouter",
        is_gateway: true,
        is_local: false,
        detect_by_key_prefix: Some("sk-or-"),
        detect_by_base_keyword: Some("openrouter"),
        default_api_base: Some("https://openrouter.ai/api/v1"),
        strip_model_prefix: false,
    },
    // Gemini through its OpenAI-compatible endpoint
    ProviderSpec {
        name: "gemini",
        keywords: &["gemini", "gemma"],
        display_name: "Gemini",
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        detect_by_base_keyword: Some("generativelanguage"),
        default_api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai"),
        strip_model_prefix: true,
    },
    ProviderSpec {
        name: "openai",
        keywords: &["openai", "gpt"],
        display_name: "OpenAI",
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        detect_by_base_keyword: None,
        default_api_base: Some("https://api.openai.com/v1"),
        strip_model_prefix: true,
    },
    ProviderSpec {
        name: "deepseek",
        keywords: &["deepseek"],
        display_name: "DeepSeek",
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        detect_by_base_keyword: None,
        default_api_base: Some("https://api.deepseek.com/v1"),
        strip_model_prefix: true,
    },
    // Groq model ids contain vendor slashes, keep them
    ProviderSpec {
        name: "groq",
        keywords: &["groq"],
        display_name: "Groq",
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: Some("gsk_"),
        detect_by_base_keyword: Some("groq"),
        default_api_base: Some("https://api.groq.com/openai/v1"),
        strip_model_prefix: false,
    },
    // vLLM (self-hosted)
    ProviderSpec {
        name: "vllm",
        keywords: &["vllm"],
        display_name: "vLLM",
        is_gateway: false,
        is_local: true,
        detect_by_key_prefix: None,
        detect_by_base_keyword: None,
        default_api_base: Some("http://localhost:8000/v1"),
        strip_model_prefix: false,
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Find a provider spec by matching keywords against a model name.
///
/// Skips gateways and local providers — those are fallback only.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();
    PROVIDERS.iter().find(|spec| {
        !spec.is_gateway
            && !spec.is_local
            && spec.keywords.iter().any(|kw| model_lower.contains(kw))
    })
}

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Auto-detect a provider from its API key prefix or base URL.
pub fn detect(api_key: Option<&str>, api_base: Option<&str>) -> Option<&'static ProviderSpec> {
    if let Some(key) = api_key {
        if let Some(spec) = PROVIDERS
            .iter()
            .find(|s| s.detect_by_key_prefix.is_some_and(|pfx| key.starts_with(pfx)))
        {
            return Some(spec);
        }
    }

    let base_lower = api_base?.to_lowercase();
    PROVIDERS
        .iter()
        .find(|s| s.detect_by_base_keyword.is_some_and(|kw| base_lower.contains(kw)))
}

/// The model id to put in the request body.
pub fn resolve_model_name(model: &str, spec: &ProviderSpec) -> String {
    if spec.strip_model_prefix {
        if let Some(pos) = model.rfind('/') {
            return model[pos + 1..].to_string();
        }
    }
    model.to_string()
}

/// Re-export the provider config from core — single source of truth.
pub use counselor_core::config::schema::ProviderConfig;

/// Match a model name to a configured provider.
///
/// 1. Keyword match, only if that provider has an API key.
/// 2. A configured slot whose key prefix or base URL identifies a provider
///    (an OpenRouter key pasted into the `openai` slot routes via OpenRouter).
/// 3. Fallback to the first configured gateway, then a configured local endpoint.
pub fn match_provider<'a>(
    model: &str,
    providers: &'a HashMap<String, ProviderConfig>,
) -> Option<(&'a ProviderConfig, &'static ProviderSpec)> {
    if let Some(spec) = find_by_model(model) {
        if let Some(config) = providers.get(spec.name).filter(|c| c.is_configured()) {
            return Some((config, spec));
        }
    }

    for slot in PROVIDERS {
        let Some(config) = providers.get(slot.name).filter(|c| c.is_configured()) else {
            continue;
        };
        if let Some(spec) = detect(Some(&config.api_key), config.api_base.as_deref()) {
            return Some((config, spec));
        }
    }

    let fallbacks = PROVIDERS
        .iter()
        .filter(|s| s.is_gateway)
        .chain(PROVIDERS.iter().filter(|s| s.is_local));

    for spec in fallbacks {
        if let Some(config) = providers.get(spec.name).filter(|c| c.is_configured()) {
            return Some((config, spec));
        }
    }
    None
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
