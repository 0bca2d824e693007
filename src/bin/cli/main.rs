mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::{ClientError, EnzoLearnClient};
use enzolearn::config;
use output::{OutputConfig, OutputFormat};
use std::process;

/// CLI for the EnzoLearn study API
#[derive(Parser, Debug)]
#[clap(name = "enzolearn-cli", about = "CLI for the EnzoLearn study API")]
struct Cli {
    /// Server URL to connect to
    #[clap(long, env = "ENZOLEARN_URL", global = true)]
    server_url: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register, log in and out
    #[command(subcommand)]
    Auth(commands::auth::AuthCommands),
    /// Manage collections
    #[command(subcommand)]
    Collection(commands::collection::CollectionCommands),
    /// Manage study items
    #[command(subcommand)]
    Item(commands::item::ItemCommands),
    /// Manage flashcard sets
    #[command(subcommand)]
    Flashcards(commands::flashcards::FlashcardCommands),
    /// Generate flashcards, summaries and tutor answers
    #[command(subcommand)]
    Ai(commands::ai::AiCommands),
    /// Show recent activity
    Activity(commands::activity::ActivityArgs),
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    if let Some(dir) = config::get_config_dir_path() {
        if let Ok(update) = config::config_from_file(Some(dir.join("config.toml"))) {
            if let Some(url) = update.server_url {
                return url;
            }
        }
    }

    "http://localhost:5000".to_string()
}

/// Formats an error for human-readable stderr output
fn format_error(err: &(dyn std::error::Error + 'static)) -> String {
    if let Some(ClientError::Request(e)) = err.downcast_ref::<ClientError>() {
        if e.is_connect() {
            return format!("Could not connect to server. Is enzolearn running?\n  {e}");
        }
    }
    err.to_string()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let token_path = config::get_config_dir_path().map(|dir| dir.join("token"));
    let mut client = EnzoLearnClient::new(server_url, token_path);
    let output_config = OutputConfig { format: cli.format, quiet: cli.quiet };

    let result = match cli.command {
        Commands::Auth(cmd) => commands::auth::execute(&mut client, cmd, &output_config).await,
        Commands::Collection(cmd) => commands::collection::execute(&client, cmd, &output_config).await,
        Commands::Item(cmd) => commands::item::execute(&client, cmd, &output_config).await,
        Commands::Flashcards(cmd) => commands::flashcards::execute(&client, cmd, &output_config).await,
        Commands::Ai(cmd) => commands::ai::execute(&client, cmd, &output_config).await,
        Commands::Activity(args) => commands::activity::execute(&client, args, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
