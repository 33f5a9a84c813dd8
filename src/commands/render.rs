//! Terminal rendering for conversation turns, documents and status
//!
//! The `format_*` functions return strings so they can be tested; the
//! `print_*` wrappers write them to the terminal.

use crate::conversation::{Message, Role};
use crate::knowledge::Document;
use crate::session::Session;
use crate::upload::{self, UploadState};

use colored::Colorize;
use prettytable::{format, row, Table};
use std::fmt::Write as _;

/// `"1 chunk"`, `"3 chunks"`
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Render one conversation turn
///
/// Sections are only shown when they have content: the confidence line
/// when a score was reported, sources when at least one was cited, and
/// follow-ups when any were suggested.
pub fn format_message(msg: &Message) -> String {
    let mut out = String::new();

    if msg.role == Role::User {
        let _ = writeln!(out, "{} {}", "You:".bold(), msg.content);
        return out;
    }
    if msg.is_error {
        let _ = writeln!(out, "{}", msg.content.red());
        return out;
    }

    let _ = writeln!(out, "{}", msg.content);

    if let Some(percent) = msg.confidence.percent() {
        let _ = writeln!(out, "{}", format!("Confidence: {}%", percent).dimmed());
    }

    if msg.has_sources() {
        let _ = writeln!(
            out,
            "\n{}",
            plural(msg.sources.len(), "Source").cyan().bold()
        );
        for (i, source) in msg.sources.iter().enumerate() {
            let label = source.label().unwrap_or("Unknown document");
            let mut line = format!("  [{}] {}", i + 1, label);
            if let Some(page) = source.page {
                let _ = write!(line, " (page {})", page);
            }
            let _ = writeln!(out, "{}", line);
            if let Some(excerpt) = source.content.as_deref().filter(|c| !c.trim().is_empty()) {
                let _ = writeln!(out, "      {}", excerpt.trim().italic());
            }
        }
    }

    if !msg.follow_ups.is_empty() {
        let _ = writeln!(out, "\n{}", "You might also ask:".yellow());
        for question in &msg.follow_ups {
            let _ = writeln!(out, "  - {}", question);
        }
    }

    out
}

pub fn print_message(msg: &Message) {
    println!("\n{}", format_message(msg));
}

/// Chunk column text for a document
pub fn chunk_label(doc: &Document) -> String {
    match doc.chunk_count {
        Some(n) => plural(n as usize, "chunk"),
        None => "-".to_string(),
    }
}

/// Print the document list as a table
pub fn print_documents(documents: &[Document]) {
    if documents.is_empty() {
        println!("{}", "No documents uploaded yet.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["File".bold(), "Chunks".bold()]);
    for doc in documents {
        table.add_row(row![doc.file_name.cyan(), chunk_label(doc)]);
    }

    println!("\n{}:", plural(documents.len(), "document"));
    table.printstd();
    println!();
}

/// Print a dismissible error banner
pub fn print_banner(message: &str) {
    eprintln!(
        "{} {}  {}",
        "!".red().bold(),
        message.red(),
        "(/dismiss to clear)".dimmed()
    );
}

/// One-line description of the upload slot
pub fn format_upload_state(state: &UploadState) -> String {
    match state {
        UploadState::Idle => "idle".to_string(),
        UploadState::Validating => "validating".to_string(),
        UploadState::Uploading(name) => format!("uploading {}", name),
        UploadState::Succeeded => "last upload succeeded".to_string(),
        UploadState::Failed(reason) => format!("last upload failed: {}", reason),
    }
}

/// Display status information about the current session
pub fn print_status(session: &Session) {
    let conversation = session.conversation.snapshot();
    let documents = session.store.documents(&session.kb_id);

    println!("\n{}", "Session Status".bold());
    println!("Agent:          {}", session.conversation.agent_id().cyan());
    println!("Knowledge base: {}", session.kb_id.cyan());
    println!(
        "Documents:      {}{}",
        plural(documents.len(), "document"),
        if session.store.is_loading(&session.kb_id) {
            " (refreshing)"
        } else {
            ""
        }
    );
    println!(
        "Conversation:   {}",
        plural(conversation.messages.len(), "message")
    );
    println!(
        "Upload:         {}",
        format_upload_state(&session.uploads.state())
    );
    println!(
        "Upload limit:   {}",
        upload::describe_limit(session.uploads.max_file_size())
    );
    if let Some(error) = conversation.last_error {
        println!("Last error:     {}", error.red());
    }
    if let Some(banner) = session.banner() {
        println!("Banner:         {}", banner.red());
    }
    println!();
}
