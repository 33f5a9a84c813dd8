//! Special commands parser for interactive chat mode
//!
//! Lines starting with `/` manage the knowledge base and the session
//! instead of being sent to the agent. Command words are case-insensitive;
//! arguments (paths, file names) keep their case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show the mirrored document list
    ListDocuments,

    /// Re-fetch the document list from the service
    Refresh,

    /// Upload a local PDF
    Upload(PathBuf),

    /// Delete a document by file name
    Delete(String),

    /// Resubmit the last query if it failed
    Retry,

    /// Clear any error banner
    Dismiss,

    /// Show identifiers, pending state and upload state
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; the input is a query
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands and for missing or
/// unexpected arguments.
///
/// # Examples
///
/// ```
/// use kbsearch::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/delete Contract.pdf").unwrap();
/// assert_eq!(cmd, SpecialCommand::Delete("Contract.pdf".to_string()));
///
/// let cmd = parse_special_command("What is the refund policy?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let no_args = |cmd: SpecialCommand| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: word.clone(),
                arg: rest.to_string(),
            })
        }
    };

    match word.as_str() {
        "/docs" | "/documents" => no_args(SpecialCommand::ListDocuments),
        "/refresh" => no_args(SpecialCommand::Refresh),
        "/retry" => no_args(SpecialCommand::Retry),
        "/dismiss" => no_args(SpecialCommand::Dismiss),
        "/status" => no_args(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        "/upload" if rest.is_empty() => Err(CommandError::MissingArgument {
            command: "/upload".to_string(),
            usage: "/upload <path/to/file.pdf>".to_string(),
        }),
        "/upload" => Ok(SpecialCommand::Upload(PathBuf::from(rest))),

        "/delete" | "/rm" if rest.is_empty() => Err(CommandError::MissingArgument {
            command: "/delete".to_string(),
            usage: "/delete <file name>".to_string(),
        }),
        "/delete" | "/rm" => Ok(SpecialCommand::Delete(rest.to_string())),

        _ => Err(CommandError::UnknownCommand(word.clone())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

DOCUMENTS:
  /docs             - Show documents in the knowledge base
  /refresh          - Re-fetch the document list
  /upload <path>    - Upload a PDF (50MB maximum)
  /delete <name>    - Delete a document by file name

SESSION:
  /retry            - Resubmit the last query if it failed
  /dismiss          - Clear the error banner
  /status           - Show session status
  /help             - Show this help message
  exit, quit        - Leave the session

Any other input is sent to the agent as a question.
"#
    );
}
