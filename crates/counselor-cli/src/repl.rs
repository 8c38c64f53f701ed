//! Interactive REPL for `counselor chat`.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use std::path::PathBuf;

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use counselor_agent::{ChatRequest, SessionOrchestrator};

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Clear,
    Attach(&'a str),
    Message(&'a str),
}

fn classify(line: &str) -> Option<Input<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if EXIT_COMMANDS.contains(&trimmed.to_lowercase().as_str()) {
        return Some(Input::Exit);
    }
    if trimmed == "/clear" {
        return Some(Input::Clear);
    }
    if let Some(path) = trimmed.strip_prefix("/file ") {
        let path = path.trim();
        if !path.is_empty() {
            return Some(Input::Attach(path));
        }
    }
    Some(Input::Message(trimmed))
}

/// Run the interactive REPL loop.
///
/// `file` is attached to the first message sent.
pub async fn run(orchestrator: SessionOrchestrator, session_id: &str, file: Option<PathBuf>) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;
    let mut pending_file = file;

    loop {
        let line = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let Some(input) = classify(&line) else {
            continue;
        };
        let _ = editor.add_history_entry(line.as_str());

        let message = match input {
            Input::Exit => {
                println!("\nTake care. 🌿");
                break;
            }
            Input::Clear => {
                orchestrator.store().clear(session_id).await;
                println!("Conversation cleared.\n");
                continue;
            }
            Input::Attach(path) => {
                pending_file = Some(PathBuf::from(path));
                println!("Attached {path} to your next message.\n");
                continue;
            }
            Input::Message(text) => text,
        };

        let mut request = ChatRequest::new(message).with_session(session_id);
        if let Some(path) = pending_file.take() {
            match helpers::read_attachment(&path) {
                Ok((bytes, name)) => request = request.with_attachment(bytes, name),
                Err(e) => {
                    eprintln!("\n❌ {e:#}\n");
                    continue;
                }
            }
        }

        debug!(session = session_id, "processing input");
        helpers::print_thinking();

        let result = orchestrator.handle(request).await;
        helpers::clear_thinking();
        match result {
            Ok(outcome) => helpers::print_response(&outcome.reply),
            Err(e) => eprintln!("\n❌ Error: {e}\n"),
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn history_path() -> PathBuf {
    counselor_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
