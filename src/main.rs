//! kbsearch - Conversational search over a document knowledge base
//!
#![doc = "Main entry point for the kbsearch CLI."]

use anyhow::Result;

use kbsearch::cli::{Cli, Commands};
use kbsearch::commands;
use kbsearch::config::Config;
use kbsearch::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Initialize logging from the loaded configuration
    logging::init_logging(&config.logging, cli.verbose)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Ask { question } => {
            tracing::info!("Asking a single question");
            commands::ask::run_ask(config, question).await?;
            Ok(())
        }
        Commands::Docs { command } => {
            tracing::info!("Starting document command");
            commands::docs::handle_docs(&config, command).await?;
            Ok(())
        }
        Commands::Demo { script } => {
            commands::demo::run_demo(&config.demo, script).await?;
            Ok(())
        }
    }
}
