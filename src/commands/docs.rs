//! Document library commands
//!
//! Shared by the `docs` subcommands and the chat session's slash commands.

use crate::cli::DocsCommand;
use crate::commands::render;
use crate::config::Config;
use crate::error::Result;
use crate::session::Session;
use crate::upload::UploadOutcome;

use colored::Colorize;

/// Print the result of an accepted upload
pub fn report_upload(outcome: &UploadOutcome) {
    println!("{} {}", "Uploaded".green(), outcome.file_name.cyan());
    if !outcome.refreshed {
        println!(
            "{}",
            "Document list could not be refreshed; run /refresh to retry.".yellow()
        );
    }
}

/// Handle `kbsearch docs ...`
///
/// # Errors
///
/// Returns an error if the request fails; the message has already been
/// printed as a banner.
pub async fn handle_docs(config: &Config, command: DocsCommand) -> Result<()> {
    let session = Session::from_config(config)?;

    match command {
        DocsCommand::List { json } => {
            let documents = session.refresh_documents().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                render::print_documents(&documents);
            }
        }
        DocsCommand::Upload { path } => match session.uploads.submit_path(&path).await {
            Ok(outcome) => {
                report_upload(&outcome);
                render::print_documents(&outcome.documents);
            }
            Err(e) => {
                render::print_banner(&e.user_message());
                return Err(e.into());
            }
        },
        DocsCommand::Delete { names } => match session.remove_documents(&names).await {
            Ok(()) => {
                println!(
                    "{} {}",
                    "Deleted".green(),
                    render::plural(names.len(), "document")
                );
                render::print_documents(&session.store.documents(&session.kb_id));
            }
            Err(e) => {
                render::print_banner(&e.user_message());
                return Err(e.into());
            }
        },
    }

    Ok(())
}
