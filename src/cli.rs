use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "opschat")]
#[command(about = "Terminal chat client for a poll-based agentic automation backend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Backend base URL (overrides the configured one)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat interface
    Chat,

    /// Send one message, poll to completion, and print the result
    Ask {
        /// Message text to send
        text: String,
    },

    /// Check that the backend is reachable and healthy
    Health,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            command: Some(Commands::Chat),
            config: None,
            url: None,
            debug: false,
        }
    }
}
