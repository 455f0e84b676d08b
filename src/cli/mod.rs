pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rillet", version)]
#[command(about = "A terminal RSS/Atom reader with offline caching", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/rillet/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Number of feeds fetched concurrently (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Launch the TUI (default)
    Tui,
    /// Print the total number of unread posts and exit
    Unread,
    /// Fetch every feed now, bypassing the cache
    Update,
    /// List feeds with unread/total post counts
    List,
    /// Delete cached feed documents; read state is kept
    ClearCache,
}

impl Cli {
    pub fn subcommand(&self) -> Commands {
        self.command.unwrap_or(Commands::Tui)
    }
}
