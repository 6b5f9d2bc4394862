//! Command-line interface definition for Chatwire
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat and chat record management.

use clap::{Parser, Subcommand};

/// Chatwire - streaming chat client
///
/// Talk to a streaming chat backend from the terminal, with optimistic
/// local state, media attachments, and chat record management.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatwire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the backend base URL from config
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatwire
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Open an existing chat instead of creating a new one
        #[arg(long)]
        chat_id: Option<String>,

        /// User id used when creating chat records
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Manage chat records
    Chats {
        /// Chat record subcommand
        #[command(subcommand)]
        command: ChatsCommand,
    },
}

/// Chat record management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatsCommand {
    /// List chat records
    List,

    /// Create a chat record
    Create {
        /// User id the record belongs to
        #[arg(long, default_value = "local")]
        user: String,

        /// Initial title
        #[arg(long)]
        title: Option<String>,
    },

    /// Rename a chat record
    Rename {
        /// Chat identifier
        chat_id: String,

        /// New title
        title: String,
    },

    /// Delete a chat record
    Delete {
        /// Chat identifier
        chat_id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
