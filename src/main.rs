//! Chatwire - streaming chat client CLI
//!
#![doc = "Chatwire - streaming chat client"]
#![doc = "Main entry point for the chatwire terminal application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatwire::cli::{ChatsCommand, Cli, Commands};
use chatwire::commands;
use chatwire::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command.clone() {
        Commands::Chat { chat_id, user } => {
            tracing::info!("Starting interactive chat");
            if let Some(id) = &chat_id {
                tracing::debug!("Opening existing chat: {}", id);
            }
            commands::chat::run_chat(config, chat_id, user).await
        }
        Commands::Chats { command } => match command {
            ChatsCommand::List => commands::chats::run_list(config).await,
            ChatsCommand::Create { user, title } => {
                commands::chats::run_create(config, &user, title.as_deref()).await
            }
            ChatsCommand::Rename { chat_id, title } => {
                commands::chats::run_rename(config, &chat_id, &title).await
            }
            ChatsCommand::Delete { chat_id } => {
                commands::chats::run_delete(config, &chat_id).await
            }
        },
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "chatwire=debug"
    } else {
        "chatwire=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
