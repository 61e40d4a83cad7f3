//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "glint")]
#[command(version)]
#[command(about = "AI-synthesized search in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Query to search for immediately (opens the TUI)
    #[arg(value_name = "QUERY")]
    query: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a search and print the results (non-interactive)
    Search {
        /// The query to search for
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of results to request
        #[arg(long, default_value_t = glint_core::paging::MAX_REGISTERED_RESULTS)]
        max: usize,

        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Clear the cached session
    Logout,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config subcommands must work before a config file exists
    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;
    let _log_guard = glint_core::logging::init().context("init logging")?;

    match cli.command {
        None => commands::interactive::run(&config, cli.query).await,
        Some(Commands::Search { query, max, json }) => {
            commands::search::run(&config, &query, max, json).await
        }
        Some(Commands::Logout) => commands::logout::run(),
        Some(Commands::Config { .. }) => unreachable!("handled above"),
    }
}
