use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docchat_client::config::Config;
use docchat_client::transport::cli;
use docchat_client::ui_backend::ChatMode;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(
    author,
    version,
    about = "docchat - terminal client for the history and PDF chat backend",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat {
        /// Backend base URL (overrides config and DOCCHAT_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Thread to start in
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<ChatMode>,
    },

    /// Check backend health
    Health {
        /// Backend base URL (overrides config and DOCCHAT_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show configuration
    Config {
        /// Print the config file path only
        #[arg(long)]
        path: bool,

        /// Write a default config file if none exists
        #[arg(long, conflicts_with = "path")]
        init: bool,
    },
}

fn parse_mode(raw: &str) -> Result<ChatMode, String> {
    raw.parse()
}

fn load_config(base_url: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = base_url {
        config.backend.base_url = url;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "docchat_client=debug,docchat=debug"
    } else {
        "docchat_client=info,docchat=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Chat { base_url, mode } => {
            let config = load_config(base_url)?;
            cli::run_chat(config, mode).await?;
        }
        Commands::Health { base_url } => {
            let config = load_config(base_url)?;
            cli::run_health(&config).await?;
        }
        Commands::Config { path, init } => {
            let config = load_config(None)?;
            cli::run_config(&config, path, init)?;
        }
    }

    Ok(())
}
