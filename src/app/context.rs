use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, RilletError};
use crate::config::Config;
use crate::fetcher::{FeedLoader, Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::store::SqliteStore;

/// Everything a command needs, built once from an explicit [`Config`].
pub struct AppContext {
    pub config: Config,
    /// Validated subscription list in display order.
    pub urls: Vec<String>,
    pub store: Arc<SqliteStore>,
    pub loader: FeedLoader,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Config::default_db_path().map_err(|e| RilletError::Config(e.to_string()))?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher = Arc::new(HttpFetcher::with_timeout(config.fetch.timeout())?);
        Ok(Self::with_parts(config, store, fetcher))
    }

    /// Wire a context around an existing store and fetcher.
    pub fn with_parts(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Self {
        let normalizer = Normalizer::new(config.display_date_format());
        let loader = FeedLoader::new(fetcher, store.clone(), normalizer)
            .with_workers(config.fetch.workers);
        let urls = config.validated_urls();

        Self {
            config,
            urls,
            store,
            loader,
        }
    }
}
