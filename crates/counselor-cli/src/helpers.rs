//! Shared CLI helpers — attachments, reply rendering, version banner.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use counselor_core::utils::expand_home;
use serde::Deserialize;

/// Read a file to attach to a chat message. Returns the bytes and the file name.
pub fn read_attachment(path: &Path) -> Result<(Vec<u8>, String)> {
    let path = expand_home(&path.to_string_lossy());
    let bytes = std::fs::read(&path)
        .with_context(|| format!("failed to read attachment {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok((bytes, name))
}

/// The structured reply the persona asks the model for.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CounselorReply {
    safety_alert: bool,
    warm_opening: String,
    key_insights: Vec<String>,
    guiding_question: String,
    suggested_replies: Vec<String>,
}

fn parse_reply(raw: &str) -> Option<CounselorReply> {
    serde_json::from_str::<CounselorReply>(raw.trim())
        .ok()
        .filter(|r| !r.warm_opening.is_empty() || !r.key_insights.is_empty())
}

/// Print a counselor reply. Structured replies are laid out; anything else is printed raw.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "🌿 Counselor".green().bold());

    match parse_reply(response) {
        Some(reply) => {
            if reply.safety_alert {
                println!(
                    "{}",
                    "If you are in danger, please call Kiran Helpline 1800-599-0019 or your local emergency number."
                        .red()
                        .bold()
                );
            }
            println!("{}", reply.warm_opening);
            if !reply.key_insights.is_empty() {
                println!();
                for insight in &reply.key_insights {
                    println!("  • {insight}");
                }
            }
            if !reply.guiding_question.is_empty() {
                println!();
                println!("{}", reply.guiding_question.italic());
            }
            if !reply.suggested_replies.is_empty() {
                println!();
                println!("{} {}", "Try:".dimmed(), reply.suggested_replies.join(" | ").dimmed());
            }
        }
        None if response.is_empty() => println!("{}", "(no response)".dimmed()),
        None => println!("{response}"),
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🌿 Counselor".green().bold(), version.dimmed());
    println!(
        "{}",
        "Type a message, \"/file <path>\" to attach a PDF, \"/clear\" to start over, or \"exit\" to quit."
            .dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "⠿ listening...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_attachment_returns_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labs.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let (bytes, name) = read_attachment(&path).unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
        assert_eq!(name, "labs.pdf");
    }

    #[test]
    fn read_attachment_missing_file() {
        let err = read_attachment(Path::new("/nonexistent/labs.pdf")).unwrap_err();
        assert!(err.to_string().contains("failed to read attachment"));
    }

    #[test]
    fn parse_structured_reply() {
        let raw = r#"{
            "safety_alert": false,
            "warm_opening": "That sounds heavy.",
            "key_insights": ["One exam is not your worth."],
            "guiding_question": "What scares you most?",
            "suggested_replies": ["My parents", "The future", "Myself"]
        }"#;
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.warm_opening, "That sounds heavy.");
        assert_eq!(reply.suggested_replies.len(), 3);
    }

    #[test]
    fn parse_plain_text_reply_is_none() {
        assert!(parse_reply("Just talk to me.").is_none());
        assert!(parse_reply("{}").is_none());
    }
}
