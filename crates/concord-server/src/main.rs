use clap::Parser;
use concord_server::cli::{self, Cli, Commands};
use concord_server::config::ConcordConfig;
use concord_server::serve;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ConcordConfig::load_or_default(&cli.config);
    if let Some(data_dir) = cli.data_dir.clone() {
        config.server.data_dir = data_dir;
    }
    if let Some(http_addr) = cli.http_addr {
        config.server.http_addr = http_addr;
    }

    match cli.command {
        Commands::Serve => serve::run(config).await,
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli.config).await,
        Commands::Import(args) => cli::import::run(args, config).await,
        Commands::Score(args) => cli::score::run(args).await,
        Commands::Reconcile(args) => cli::reconcile::run(args, config).await,
    }
}
