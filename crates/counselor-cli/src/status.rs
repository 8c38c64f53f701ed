//! `counselor status` — show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use counselor_core::config::{get_config_path, load_config};
use counselor_providers::registry::{match_provider, PROVIDERS};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🌿 Counselor Status".green().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        found_marker(config_path.exists())
    );

    // Model and the provider that would serve it
    let providers_map = config.providers.to_map();
    let serving = match match_provider(&config.model.model, &providers_map) {
        Some((_, spec)) => format!("via {}", spec.display_name).green().to_string(),
        None => "no provider configured".red().to_string(),
    };
    println!("  {:<18} {} ({})", "Model:".bold(), config.model.model, serving);
    println!(
        "  {:<18} {} | max_tokens: {}",
        "Parameters:".bold(),
        format!("temp: {}", config.model.temperature).dimmed(),
        format!("{}", config.model.max_tokens).dimmed(),
    );

    // Persona
    let persona = match config.chat.system_instruction_file {
        Some(ref path) => {
            let expanded = counselor_core::utils::expand_home(path);
            format!("{} {}", expanded.display(), found_marker(expanded.exists()))
        }
        None => "built-in".dimmed().to_string(),
    };
    println!("  {:<18} {}", "Persona:".bold(), persona);

    // History bounds
    let bounds = match config.context.policy() {
        Ok(policy) => format!(
            "compact above {} turns, keep {}",
            policy.max_len(),
            policy.keep_recent()
        ),
        Err(e) => e.to_string().red().to_string(),
    };
    println!("  {:<18} {}", "History:".bold(), bounds);

    println!(
        "  {:<18} http://{}:{}",
        "Server:".bold(),
        config.gateway.host,
        config.gateway.port
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let configured = providers_map
            .get(spec.name)
            .is_some_and(|p| p.is_configured());
        let status = if configured {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{}", "· not configured".dimmed())
        };
        println!("    {:<20} {}", spec.display_name, status);
    }

    println!();
    Ok(())
}

fn found_marker(exists: bool) -> String {
    if exists {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}
