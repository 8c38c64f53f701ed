//! `counselor onboard` — write the default config and persona files.
//!
//! - Creates `~/.counselor/config.json` with defaults
//! - Writes the built-in persona to `~/.counselor/persona.md` for editing

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use counselor_agent::persona::scaffold_persona;
use counselor_core::config::{get_config_path, save_config, Config};
use counselor_core::utils::get_data_path;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🌿 Counselor — Setup".green().bold());
    println!();

    let data_dir = get_data_path();
    onboard_into(&data_dir, &get_config_path())?;

    println!();
    println!(
        "{}",
        "  Setup complete! Add an API key to config.json, then run `counselor chat`.".green()
    );
    println!(
        "{}",
        "  To customize the persona, set chat.systemInstructionFile to the persona.md path.".dimmed()
    );
    println!();

    Ok(())
}

fn onboard_into(data_dir: &Path, config_path: &Path) -> Result<()> {
    // 1. Config
    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        // Defaults only: env overrides may carry API keys and stay out of the file.
        save_config(&Config::default(), Some(config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("  {} created config at {}", "✓".green(), config_path.display());
    }

    // 2. Persona template
    let persona_path = data_dir.join("persona.md");
    let written = scaffold_persona(&persona_path)
        .with_context(|| format!("failed to write {}", persona_path.display()))?;
    if written {
        println!("  {} created persona at {}", "✓".green(), persona_path.display());
    } else {
        println!("  {} persona.md already exists", "✓".green());
    }

    // 3. REPL history directory
    let history_dir = data_dir.join("history");
    std::fs::create_dir_all(&history_dir)
        .with_context(|| format!("failed to create {}", history_dir.display()))?;

    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
