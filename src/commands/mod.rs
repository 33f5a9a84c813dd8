/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`  - Interactive question/answer session with document management
- `ask`   - One-shot question
- `docs`  - Document library listing, upload and deletion
- `demo`  - Demo script runner
*/

use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::Result;
use crate::session::Session;

pub mod demo;
pub mod docs;
pub mod render;

// Special commands parser for the chat session
pub mod special_commands;

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Fetches the document list, then runs a readline-based loop: slash
    //! commands manage documents and the session, anything else is a
    //! question for the agent. A line ending in `\` continues on the next
    //! line, the terminal equivalent of shift+enter.

    use super::*;
    use crate::conversation::{ConversationController, KeyInput, SubmitOutcome};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Examples
    ///
    /// ```
    /// use kbsearch::commands::chat;
    /// use kbsearch::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default()).await?;
    /// ```
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let session = Session::from_config(&config)?;
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&session);
        match session.refresh_documents().await {
            Ok(documents) => println!(
                "{} in knowledge base {}\n",
                render::plural(documents.len(), "document"),
                session.kb_id.cyan()
            ),
            Err(e) => render::print_banner(&e.user_message()),
        }

        loop {
            let prompt = if session.conversation.input().is_empty() {
                format!("{} ", "kb>".green().bold())
            } else {
                format!("{} ", "...".dimmed())
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let composing = !session.conversation.input().is_empty();
                    let trimmed = line.trim();
                    if trimmed.is_empty() && !composing {
                        continue;
                    }

                    if !composing {
                        match parse_special_command(trimmed) {
                            Ok(SpecialCommand::None) => {}
                            Ok(SpecialCommand::Exit) => break,
                            Ok(command) => {
                                handle_special_command(&session, command).await;
                                continue;
                            }
                            Err(e) => {
                                eprintln!("{}\n", e.to_string().red());
                                continue;
                            }
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    let outcome = feed_line(&session.conversation, &line).await;
                    report_outcome(&outcome);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Type one terminal line into the conversation input buffer
    ///
    /// A trailing backslash becomes a newline in the buffer; otherwise the
    /// line ends with Enter, which submits the whole buffer.
    pub async fn feed_line(conversation: &ConversationController, line: &str) -> SubmitOutcome {
        let (text, continued) = match line.strip_suffix('\\') {
            Some(text) => (text, true),
            None => (line, false),
        };
        for c in text.chars() {
            conversation.handle_key(KeyInput::Char(c)).await;
        }
        conversation
            .handle_key(KeyInput::Enter { shift: continued })
            .await
    }

    fn report_outcome(outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Answered(msg) => render::print_message(msg),
            SubmitOutcome::Failed(msg) => {
                render::print_message(msg);
                println!("{}\n", "Type /retry to ask again.".dimmed());
            }
            SubmitOutcome::Ignored => {}
        }
    }

    /// Execute a slash command against the session
    ///
    /// Failures are printed as banners; the session stays usable.
    pub async fn handle_special_command(session: &Session, command: SpecialCommand) {
        match command {
            SpecialCommand::ListDocuments => {
                if !session.store.is_loaded(&session.kb_id) {
                    if let Err(e) = session.refresh_documents().await {
                        render::print_banner(&e.user_message());
                        return;
                    }
                }
                render::print_documents(&session.store.documents(&session.kb_id));
            }
            SpecialCommand::Refresh => match session.refresh_documents().await {
                Ok(documents) => render::print_documents(&documents),
                Err(e) => render::print_banner(&e.user_message()),
            },
            SpecialCommand::Upload(path) => {
                println!("Uploading {}...", path.display());
                match session.uploads.submit_path(&path).await {
                    Ok(outcome) => {
                        docs::report_upload(&outcome);
                        render::print_documents(&outcome.documents);
                    }
                    Err(e) => render::print_banner(&e.user_message()),
                }
            }
            SpecialCommand::Delete(name) => {
                match session.remove_documents(std::slice::from_ref(&name)).await {
                    Ok(()) => {
                        println!("{} {}", "Deleted".green(), name.cyan());
                        render::print_documents(&session.store.documents(&session.kb_id));
                    }
                    Err(e) => render::print_banner(&e.user_message()),
                }
            }
            SpecialCommand::Retry => {
                let outcome = session.conversation.retry_last().await;
                if outcome == SubmitOutcome::Ignored {
                    println!("{}\n", "Nothing to retry.".yellow());
                }
                report_outcome(&outcome);
            }
            SpecialCommand::Dismiss => {
                session.conversation.dismiss_error();
                session.dismiss_banner();
            }
            SpecialCommand::ShowStatus => render::print_status(session),
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn print_welcome_banner(session: &Session) {
        println!("\n{}", "Knowledge Search Assistant".bold());
        println!(
            "Agent {} | Knowledge base {}",
            session.conversation.agent_id().cyan(),
            session.kb_id.cyan()
        );
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

}

// One-shot question handler
pub mod ask {
    use super::*;
    use crate::conversation::SubmitOutcome;

    /// Ask one question and print the rendered answer
    ///
    /// # Errors
    ///
    /// Returns an error for a blank question or a failed query.
    pub async fn run_ask(config: Config, question: Vec<String>) -> Result<()> {
        let question = question.join(" ");
        let session = Session::from_config(&config)?;

        match session.conversation.submit_text(&question).await {
            SubmitOutcome::Answered(msg) => {
                print!("{}", render::format_message(&msg));
                Ok(())
            }
            SubmitOutcome::Failed(msg) => anyhow::bail!("{}", msg.content),
            SubmitOutcome::Ignored => anyhow::bail!("Question cannot be empty"),
        }
    }
}
