pub mod http_fetcher;
pub mod loader;
pub mod parallel;
pub mod progress;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;
pub use loader::{FeedLoader, FRESHNESS_WINDOW_HOURS};
pub use parallel::{LoadEvent, DEFAULT_WORKERS};
pub use progress::FeedAggregator;

/// Network retrieval of one feed document.
#[async_trait]
pub trait Fetcher {
    /// Full response body for `url`. Non-success statuses and empty bodies
    /// are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
