pub mod config_cmd;
pub mod import;
pub mod reconcile;
pub mod score;

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(version, about = "Entity name reconciliation service")]
pub struct Cli {
    /// Path to concord.toml
    #[arg(
        long,
        global = true,
        env = "CONCORD_CONFIG",
        default_value = "concord.toml"
    )]
    pub config: PathBuf,

    /// Path to data directory (overrides config file)
    #[arg(long, global = true, env = "CONCORD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// HTTP listen address (overrides config file)
    #[arg(long, global = true, env = "CONCORD_HTTP_ADDR")]
    pub http_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Load candidate entities into the store
    Import(ImportArgs),
    /// Print the string-similarity score of two names
    Score(ScoreArgs),
    /// Run one reconciliation request from a JSON file
    Reconcile(ReconcileArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub file: PathBuf,
    /// "json", "jsonl" or "csv"; detected from the extension if omitted
    #[arg(long)]
    pub format: Option<String>,
    /// Entity type applied to every imported record
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    pub a: String,
    pub b: String,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Request body file; "-" reads stdin
    pub file: PathBuf,
    /// Force string-similarity matching even when an API key is set
    #[arg(long)]
    pub no_oracle: bool,
}
