/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `chat`  — Interactive chat loop over a streaming session
- `chats` — Chat record management (list, create, rename, delete)

These handlers are intentionally small and use the library components:
the session manager, the chat store, and the credential providers.
*/

use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::auth::{CredentialProvider, EnvCredentials};
use crate::chats::ChatStore;
use crate::config::Config;
use crate::error::Result;

// Special commands parser for the chat loop
pub mod special_commands;

/// Build a chat store from configuration
fn make_store(config: &Config) -> Result<ChatStore> {
    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(EnvCredentials::new(&config.auth.token_env));
    let api = ApiClient::new(
        &config.backend.base_url,
        Duration::from_secs(config.backend.request_timeout_seconds),
        credentials,
    )?;
    Ok(ChatStore::new(api))
}

// Chat command handler
pub mod chat {
    //! Interactive chat loop handler.
    //!
    //! Creates a `ChatSession`, opens or creates a chat record, and runs a
    //! readline-based loop that submits user input through the session.
    //! The loop is a pure subscriber: it renders conversation snapshots
    //! and session phase, and never mutates state directly.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::session::{ChatSession, MediaAttachment, Role};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::Path;

    /// Start the interactive chat loop
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `chat_id` - Existing chat to open; a new record is created when absent
    /// * `user` - User id for newly created chat records
    pub async fn run_chat(config: Config, chat_id: Option<String>, user: String) -> Result<()> {
        let credentials: Arc<dyn CredentialProvider> =
            Arc::new(EnvCredentials::new(&config.auth.token_env));
        let session = ChatSession::new(&config, credentials)?;

        match chat_id {
            Some(id) => {
                session.open_chat(&id).await?;
                println!(
                    "Opened chat {} ({} messages)",
                    id.cyan(),
                    session.messages().len()
                );
            }
            None => {
                let id = session.store().create(&user, None).await?;
                session.select_chat(&id);
                println!("Started chat {}", id.cyan());
            }
        }
        println!("Type {} for commands.\n", "/help".bold());

        let mut rl = DefaultEditor::new()?;
        let mut pending: Vec<MediaAttachment> = Vec::new();

        loop {
            match rl.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        SpecialCommand::Exit => break,
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Status => {
                            print_status(&session, &pending);
                            continue;
                        }
                        SpecialCommand::Cancel => {
                            session.cancel();
                            println!("Cancelled.");
                            continue;
                        }
                        SpecialCommand::New => {
                            match session.store().create(&user, None).await {
                                Ok(id) => {
                                    session.select_chat(&id);
                                    pending.clear();
                                    println!("Started chat {}", id.cyan());
                                }
                                Err(err) => println!("{} {}", "error:".red(), err),
                            }
                            continue;
                        }
                        SpecialCommand::Open(id) => {
                            match session.open_chat(&id).await {
                                Ok(()) => {
                                    pending.clear();
                                    println!(
                                        "Opened chat {} ({} messages)",
                                        id.cyan(),
                                        session.messages().len()
                                    );
                                }
                                Err(err) => println!("{} {}", "error:".red(), err),
                            }
                            continue;
                        }
                        SpecialCommand::Attach(path) => {
                            match MediaAttachment::from_path(Path::new(&path)) {
                                Ok(file) => {
                                    println!(
                                        "Attached {} ({} bytes, {})",
                                        file.filename.bold(),
                                        file.len(),
                                        file.content_type
                                    );
                                    pending.push(file);
                                }
                                Err(err) => println!("{} {}", "error:".red(), err),
                            }
                            continue;
                        }
                        SpecialCommand::Unknown(command) => {
                            println!("Unknown command {}; try {}.", command, "/help".bold());
                            continue;
                        }
                        SpecialCommand::None => {
                            // Regular chat turn.
                        }
                    }

                    let attachments = std::mem::take(&mut pending);
                    match session.submit(trimmed, attachments).await {
                        Ok(()) => {
                            let messages = session.messages();
                            if let Some(reply) =
                                messages.iter().rev().find(|m| m.role == Role::Assistant)
                            {
                                let text = reply.text();
                                if !text.is_empty() {
                                    println!("\n{}\n", text);
                                }
                            }
                        }
                        Err(err) => println!("{} {}", "error:".red(), err),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    /// Print session status: phase, chat, message count, queued attachments
    fn print_status(session: &ChatSession, pending: &[MediaAttachment]) {
        println!("Phase: {}", session.phase());
        println!(
            "Chat: {}",
            session.chat_id().unwrap_or_else(|| "none".to_string())
        );
        println!("Messages: {}", session.messages().len());
        if pending.is_empty() {
            println!("Attachments: none");
        } else {
            println!("Attachments:");
            for file in pending {
                println!("  {} ({} bytes)", file.filename, file.len());
            }
        }
    }
}

// Chat record command handlers
pub mod chats {
    //! Chat record management handlers.

    use super::*;
    use colored::Colorize;

    /// List chat records
    pub async fn run_list(config: Config) -> Result<()> {
        let store = make_store(&config)?;
        let records = store.list().await?;
        if records.is_empty() {
            println!("No chats.");
            return Ok(());
        }
        for record in records {
            let title = record
                .title
                .clone()
                .unwrap_or_else(|| "Untitled".to_string());
            let created = record
                .created_at_utc()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!("{}  {}  {}", record.chat_id.cyan(), title.bold(), created);
        }
        Ok(())
    }

    /// Create a chat record and print its id
    pub async fn run_create(config: Config, user: &str, title: Option<&str>) -> Result<()> {
        let store = make_store(&config)?;
        let chat_id = store.create(user, title).await?;
        println!("{}", chat_id);
        Ok(())
    }

    /// Rename a chat record
    pub async fn run_rename(config: Config, chat_id: &str, title: &str) -> Result<()> {
        let store = make_store(&config)?;
        store.rename(chat_id, title).await?;
        println!("Renamed {} to {}", chat_id.cyan(), title.bold());
        Ok(())
    }

    /// Delete a chat record
    pub async fn run_delete(config: Config, chat_id: &str) -> Result<()> {
        let store = make_store(&config)?;
        store.delete(chat_id).await?;
        println!("Deleted {}", chat_id.cyan());
        Ok(())
    }
}
