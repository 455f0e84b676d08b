use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rillet::app::AppContext;
use rillet::cli::{commands, Cli, Commands};
use rillet::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they stay off the TUI screen
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.fetch.workers = workers;
    }

    let ctx = AppContext::new(config, cli.db.clone())?;

    match cli.subcommand() {
        Commands::Tui => {
            rillet::tui::run(Arc::new(ctx)).await?;
        }
        Commands::Unread => {
            commands::print_unread(&ctx).await?;
        }
        Commands::Update => {
            commands::update_feeds(&ctx).await?;
        }
        Commands::List => {
            commands::list_feeds(&ctx).await?;
        }
        Commands::ClearCache => {
            commands::clear_cache(&ctx)?;
        }
    }

    Ok(())
}
