//! Counselor CLI — entry point.
//!
//! # Commands
//!
//! - `counselor serve` — run the HTTP chat API
//! - `counselor chat [-m MESSAGE] [-s SESSION] [-f FILE]` — chat from the terminal (single-shot or REPL)
//! - `counselor onboard` — write default config and persona files
//! - `counselor status` — show configuration and provider status

mod helpers;
mod onboard;
mod repl;
mod server;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use counselor_agent::{
    load_persona, AttachmentExtractor, ChatRequest, OrchestratorSettings, SessionOrchestrator,
};
use counselor_core::config::{load_config, Config};
use counselor_core::ContextStore;
use counselor_providers::create_provider;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Counselor — a compassionate counseling chat service
#[derive(Parser)]
#[command(name = "counselor", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP chat API
    Serve {
        /// Override the listen host from config
        #[arg(long)]
        host: Option<String>,

        /// Override the listen port from config
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,

        /// Emit logs as JSON lines
        #[arg(long, default_value_t = false)]
        json_logs: bool,
    },

    /// Chat from the terminal (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Session identifier
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// PDF to attach to the message
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Write default config and persona files
    Onboard,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            logs,
            json_logs,
        } => {
            init_logging(if logs { LogLevel::Debug } else { LogLevel::Info }, json_logs);
            let mut config = load_config(None);
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            server::run(config).await
        }
        Commands::Chat {
            message,
            session,
            file,
            logs,
        } => {
            init_logging(if logs { LogLevel::Debug } else { LogLevel::Quiet }, false);
            run_chat(message, session, file).await
        }
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, session_id: String, file: Option<PathBuf>) -> Result<()> {
    let config = load_config(None);
    let orchestrator = build_orchestrator(&config)?;

    match message {
        Some(msg) => {
            info!(session = %session_id, "processing single message");
            let mut request = ChatRequest::new(msg).with_session(session_id);
            if let Some(path) = file {
                let (bytes, name) = helpers::read_attachment(&path)?;
                request = request.with_attachment(bytes, name);
            }
            let outcome = orchestrator
                .handle(request)
                .await
                .context("chat request failed")?;
            helpers::print_response(&outcome.reply);
        }
        None => {
            repl::run(orchestrator, &session_id, file).await?;
        }
    }

    Ok(())
}

/// Wire the context store, inference gateway, extractor and persona from config.
pub fn build_orchestrator(config: &Config) -> Result<SessionOrchestrator> {
    let policy = config
        .context
        .policy()
        .context("invalid context bounds in config")?;
    let store = Arc::new(ContextStore::new(policy));

    let providers_map = config.providers.to_map();
    let provider = create_provider(&config.model.model, &providers_map)?;

    let persona = load_persona(config.chat.system_instruction_file.as_deref())?;
    let settings = OrchestratorSettings::from_config(config, persona);
    let extractor = AttachmentExtractor::from_config(&config.attachments);

    Ok(SessionOrchestrator::new(
        store,
        Arc::new(provider),
        extractor,
        settings,
    ))
}

// ─────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Quiet,
    Info,
    Debug,
}

/// Initialize tracing. `RUST_LOG` wins over the level picked from flags.
fn init_logging(level: LogLevel, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = match level {
        LogLevel::Quiet => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => {
            "counselor=debug,counselor_agent=debug,counselor_core=debug,counselor_providers=debug,tower_http=debug,info"
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_chat_with_file() {
        let cli = Cli::parse_from(["counselor", "chat", "-m", "hi", "-f", "report.pdf"]);
        match cli.command {
            Commands::Chat {
                message,
                session,
                file,
                ..
            } => {
                assert_eq!(message.as_deref(), Some("hi"));
                assert_eq!(session, "cli");
                assert_eq!(file, Some(PathBuf::from("report.pdf")));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn build_orchestrator_requires_provider_key() {
        let config = Config::default();
        let err = build_orchestrator(&config).err().unwrap();
        assert!(err.to_string().contains("No configured provider"));
    }

    #[test]
    fn build_orchestrator_rejects_bad_bounds() {
        let mut config = Config::default();
        config.providers.gemini.api_key = "key".into();
        config.context.keep_recent = 20;
        assert!(build_orchestrator(&config).is_err());
    }

    #[test]
    fn build_orchestrator_from_config() {
        let mut config = Config::default();
        config.providers.gemini.api_key = "key".into();
        config.chat.fallback_session_id = "lobby".into();
        config.model.max_tokens = 2048;
        config.model.temperature = 0.3;

        let orchestrator = build_orchestrator(&config).unwrap();
        let settings = orchestrator.settings();
        assert_eq!(settings.fallback_session_id, "lobby");
        assert_eq!(settings.summary_options.max_tokens, 2048);
        assert_eq!(settings.summary_options.temperature, 0.3);
        assert_eq!(settings.reply_options.max_tokens, 2048);
        assert_eq!(orchestrator.gateway().display_name(), "Gemini");
    }
}
