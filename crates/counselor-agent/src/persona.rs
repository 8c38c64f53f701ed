//! Counselor persona — the system instruction sent with every reply call.
//!
//! The default persona is embedded at compile time so the binary is
//! self-contained. `chat.systemInstructionFile` replaces it wholesale.

use std::path::{Path, PathBuf};

use counselor_core::utils::expand_home;
use tracing::{debug, info};

/// Built-in persona. Asks the model for a JSON object with `safety_alert`,
/// `warm_opening`, `key_insights`, `guiding_question` and `suggested_replies`.
pub const DEFAULT_PERSONA: &str = include_str!("../prompts/counselor.md");

#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    #[error("failed to read system instruction file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("system instruction file {0} is empty")]
    Empty(PathBuf),
}

/// Resolve the persona: the override file if one is configured, else the default.
pub fn load_persona(override_file: Option<&str>) -> Result<String, PersonaError> {
    let Some(raw) = override_file else {
        debug!("using built-in persona");
        return Ok(DEFAULT_PERSONA.to_string());
    };

    let path = expand_home(raw);
    let text = std::fs::read_to_string(&path).map_err(|source| PersonaError::Read {
        path: path.clone(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(PersonaError::Empty(path));
    }

    info!(path = %path.display(), "loaded system instruction override");
    Ok(text)
}

/// Write the built-in persona to `path` so it can be customized.
///
/// Existing files are left untouched. Returns whether a file was written.
pub fn scaffold_persona(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_PERSONA)?;
    info!(path = %path.display(), "wrote persona template");
    Ok(true)
}
