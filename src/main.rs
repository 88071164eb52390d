use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medgenie::config::Config;
use medgenie::events::DEFAULT_TOP_K;
use medgenie::{app, commands};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medgenie")]
#[command(version)]
#[command(about = "Chat with the MedGenie medical question-answering service", long_about = None)]
struct Cli {
    /// Host identity used to pick the local or production service
    #[arg(long, env = "MEDGENIE_HOST", global = true)]
    host: Option<String>,

    /// Answer service origin, overriding host-based selection
    #[arg(long, env = "MEDGENIE_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Config file to use instead of ~/.medgenie/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show the passages the service retrieves for a question
    Retrieve {
        /// The question
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Number of passages to retrieve
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: u32,
    },
    /// Print the resolved configuration
    Config {
        /// Save the resolved configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config.with_overrides(cli.host.clone(), cli.base_url.clone()))
}

/// The chat UI owns the terminal, so its logs go to a file
fn init_logging(config: &Config, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if to_file { "medgenie=info" } else { "medgenie=warn" }));

    if to_file {
        fs::create_dir_all(&config.medgenie_home)
            .context("Failed to create .medgenie directory")?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())
            .context("Failed to open log file")?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config, cli.command.is_none())?;

    match cli.command {
        None => app::run(config).await,
        Some(Commands::Ask { query }) => commands::ask(&config, &query.join(" ")).await,
        Some(Commands::Retrieve { query, top_k }) => {
            commands::retrieve(&config, &query.join(" "), top_k).await
        }
        Some(Commands::Config { write }) => commands::show_config(&config, write),
    }
}
