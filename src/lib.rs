//! # Rillet
//!
//! A terminal RSS/Atom reader that keeps working offline.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Store → Tracking → UI
//! ```
//!
//! Feeds are fetched concurrently, parsed into one domain model, and cached
//! twice (raw document and parsed feed). Read flags are stored separately,
//! keyed by each post's feed-native identifier, and merged back after every
//! load.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the TUI (urls come from ~/.config/rillet/config.toml)
//! rillet
//!
//! # Print the number of unread posts
//! rillet unread
//!
//! # Fetch everything now, ignoring the cache
//! rillet update
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the config,
/// store and loader.
pub mod app;

/// Configuration management.
///
/// Loads from `~/.config/rillet/config.toml`, supporting:
/// - Subscription urls and date format
/// - Custom colors (named or hex)
/// - Custom keybindings
pub mod config;

/// Command-line interface using clap.
///
/// - `tui` - Launch the TUI (default)
/// - `unread` - Print the unread count
/// - `update` - Fetch every feed now
/// - `list` - List feeds with counts
/// - `clear-cache` - Drop cached documents
pub mod cli;

/// Core domain models.
///
/// - [`Feed`](domain::Feed) and [`Feeds`](domain::Feeds): loaded feeds in display order
/// - [`Post`](domain::Post): one entry with its read flag
/// - [`ReadStatus`](domain::ReadStatus): persisted read flag
pub mod domain;

/// Feed retrieval.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for network fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`FeedLoader`](fetcher::FeedLoader): cache-aware loading, bounded concurrency
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0 and Atom 0.3/1.0 into [`Feed`](domain::Feed)s.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Read-state reconciliation between loaded feeds and the store.
pub mod tracking;

/// Terminal user interface.
///
/// Page-based layout built with ratatui: feed list, post list, all posts,
/// search results and a reader.
pub mod tui;
