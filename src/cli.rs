//! Command-line interface definition for kbsearch
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, document
//! library management, and the demo script runner.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kbsearch - Ask questions about your documents
///
/// Upload PDF documents to a knowledge base and get cited answers from
/// an AI agent.
#[derive(Parser, Debug, Clone)]
#[command(name = "kbsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the agent identifier from config
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Override the knowledge base identifier from config
    #[arg(long)]
    pub kb_id: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for kbsearch
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive question/answer session
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Manage the documents in the knowledge base
    Docs {
        /// Document management subcommand
        #[command(subcommand)]
        command: DocsCommand,
    },

    /// Run the bundled demo script and print its output as JSON
    Demo {
        /// Script to run instead of the configured one
        #[arg(short, long)]
        script: Option<PathBuf>,
    },
}

/// Document library subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DocsCommand {
    /// List the documents in the knowledge base
    List {
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Upload a PDF document
    Upload {
        /// Path to the PDF file
        path: PathBuf,
    },

    /// Delete one or more documents by file name
    Delete {
        /// File names to delete
        #[arg(required = true)]
        names: Vec<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            agent_id: None,
            kb_id: None,
            command: Commands::Chat,
        }
    }
}
