//! chatrelay CLI: operator entry point.
//!
//! Commands:
//! - `init`     - Create config, default prompt template and history directory
//! - `status`   - Show resolved paths, history bound and known chats
//! - `config`   - Validate, show or locate the configuration
//! - `history`  - Inspect, append to or clear stored chat history
//! - `extract`  - Run the reply extractor on raw model output
//! - `render`   - Render the prompt for a chat's current history

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "chatrelay",
    about = "chatrelay: conversational relay core",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory, default config and prompt template
    Init,

    /// Show resolved configuration and stored history summary
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Stored chat history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Extract user-facing messages from raw model output
    Extract {
        /// Read from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the messages and winning strategy as JSON
        #[arg(long)]
        json: bool,

        /// Print the raw input when nothing could be extracted
        #[arg(long)]
        raw_fallback: bool,
    },

    /// Render the prompt for a chat's current history
    Render {
        /// Chat identity
        chat: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Check that the configuration loads and is valid
    Validate,
    /// Print the resolved configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List chats with stored history
    List,

    /// Print a chat's bounded history
    Show {
        chat: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append one message to a chat
    Append {
        chat: String,

        #[arg(long)]
        sender: String,

        #[arg(long)]
        message: String,

        #[arg(long, default_value = "")]
        date: String,

        #[arg(long, default_value = "")]
        time: String,
    },

    /// Clear one chat, or every chat when none is given
    Clear {
        chat: Option<String>,

        /// Required to actually delete
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
        Commands::History { action } => match action {
            HistoryAction::List => commands::history::list().await?,
            HistoryAction::Show { chat, json } => commands::history::show(&chat, json).await?,
            HistoryAction::Append {
                chat,
                sender,
                message,
                date,
                time,
            } => commands::history::append(&chat, sender, message, date, time).await?,
            HistoryAction::Clear { chat, confirm } => {
                commands::history::clear(chat.as_deref(), confirm).await?
            }
        },
        Commands::Extract {
            file,
            json,
            raw_fallback,
        } => commands::extract::run(file.as_deref(), json, raw_fallback).await?,
        Commands::Render { chat } => commands::render::run(&chat).await?,
    }

    Ok(())
}
