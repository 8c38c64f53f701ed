//! Config loader — reads `~/.counselor/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.counselor/config.json`
//! 3. Environment variables `COUNSELOR_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path (or `path`) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `COUNSELOR_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `COUNSELOR_MODEL__MODEL`, `COUNSELOR_MODEL__MAX_TOKENS`, `COUNSELOR_MODEL__TEMPERATURE`
/// - `COUNSELOR_PROVIDERS__<NAME>__API_KEY`, `COUNSELOR_PROVIDERS__<NAME>__API_BASE`
/// - `COUNSELOR_CONTEXT__MAX_HISTORY_LENGTH`, `COUNSELOR_CONTEXT__KEEP_RECENT`
/// - `COUNSELOR_CHAT__FALLBACK_SESSION_ID`, `COUNSELOR_CHAT__REQUEST_TIMEOUT_SECS`
/// - `COUNSELOR_ATTACHMENTS__TEMP_DIR`, `COUNSELOR_ATTACHMENTS__MAX_BYTES`
/// - `COUNSELOR_GATEWAY__HOST`, `COUNSELOR_GATEWAY__PORT`
fn apply_env_overrides(mut config: Config) -> Config {
    // Model
    if let Ok(val) = std::env::var("COUNSELOR_MODEL__MODEL") {
        config.model.model = val;
    }
    if let Some(n) = env_parse("COUNSELOR_MODEL__MAX_TOKENS") {
        config.model.max_tokens = n;
    }
    if let Some(t) = env_parse("COUNSELOR_MODEL__TEMPERATURE") {
        config.model.temperature = t;
    }

    // Providers
    apply_provider_env(&mut config.providers.gemini, "GEMINI");
    apply_provider_env(&mut config.providers.openai, "OPENAI");
    apply_provider_env(&mut config.providers.openrouter, "OPENROUTER");
    apply_provider_env(&mut config.providers.deepseek, "DEEPSEEK");
    apply_provider_env(&mut config.providers.groq, "GROQ");
    apply_provider_env(&mut config.providers.vllm, "VLLM");

    // Context bounds
    if let Some(n) = env_parse("COUNSELOR_CONTEXT__MAX_HISTORY_LENGTH") {
        config.context.max_history_length = n;
    }
    if let Some(n) = env_parse("COUNSELOR_CONTEXT__KEEP_RECENT") {
        config.context.keep_recent = n;
    }

    // Chat
    if let Ok(val) = std::env::var("COUNSELOR_CHAT__FALLBACK_SESSION_ID") {
        config.chat.fallback_session_id = val;
    }
    if let Some(secs) = env_parse("COUNSELOR_CHAT__REQUEST_TIMEOUT_SECS") {
        config.chat.request_timeout_secs = Some(secs);
    }

    // Attachments
    if let Ok(val) = std::env::var("COUNSELOR_ATTACHMENTS__TEMP_DIR") {
        config.attachments.temp_dir = Some(val);
    }
    if let Some(n) = env_parse("COUNSELOR_ATTACHMENTS__MAX_BYTES") {
        config.attachments.max_bytes = n;
    }

    // Gateway
    if let Ok(val) = std::env::var("COUNSELOR_GATEWAY__HOST") {
        config.gateway.host = val;
    }
    if let Some(p) = env_parse("COUNSELOR_GATEWAY__PORT") {
        config.gateway.port = p;
    }

    config
}

/// Read and parse an env var, ignoring it (with a warning) if it does not parse.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", name, raw);
            None
        }
    }
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("COUNSELOR_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("COUNSELOR_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
