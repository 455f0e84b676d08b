use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::app::{Result, RilletError};
use crate::domain::{Feed, Feeds};
use crate::fetcher::{Fetcher, DEFAULT_WORKERS};
use crate::normalizer::Normalizer;
use crate::store::{codec, Store};
use crate::tracking;

/// Cached data younger than this is preferred over the network.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Cache-aware feed loading on top of a [`Fetcher`] and a [`Store`].
#[derive(Clone)]
pub struct FeedLoader {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    store: Arc<dyn Store + Send + Sync>,
    normalizer: Normalizer,
    workers: usize,
}

impl FeedLoader {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<dyn Store + Send + Sync>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            fetcher,
            store,
            normalizer,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store + Send + Sync> {
        &self.store
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Raw document for `url`, from the raw cache when `prefer_cache` and a
    /// record exists, otherwise from the network. Fresh bodies are cached.
    pub async fn fetch_raw(&self, url: &str, prefer_cache: bool) -> Result<Vec<u8>> {
        if prefer_cache {
            match self.store.load_raw_feed(url) {
                Ok(Some(body)) => {
                    tracing::debug!("Raw cache hit for {}", url);
                    return Ok(body);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Raw cache read failed for {}: {}", url, e),
            }
        }

        let body = self.fetcher.fetch(url).await?;

        if let Err(e) = self.store.save_raw_feed(url, &body) {
            tracing::warn!("Failed to cache raw feed {}: {}", url, e);
        }

        Ok(body)
    }

    /// Always yields a feed; failures become an error placeholder.
    pub async fn load_feed(&self, url: &str, prefer_cache: bool) -> Feed {
        if prefer_cache {
            if let Some(feed) = self.cached_feed(url) {
                return feed;
            }
        }
        self.fetch_feed(url, prefer_cache).await
    }

    /// Fetch and parse, skipping the parsed cache lookup.
    pub(crate) async fn fetch_feed(&self, url: &str, prefer_cache: bool) -> Feed {
        match self.fetch_and_parse(url, prefer_cache).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", url, e);
                Feed::error(url, e)
            }
        }
    }

    async fn fetch_and_parse(&self, url: &str, prefer_cache: bool) -> Result<Feed> {
        let body = self.fetch_raw(url, prefer_cache).await?;
        let feed = self.normalizer.normalize(url, &body)?;
        self.cache_parsed(&feed);
        Ok(feed)
    }

    fn cache_parsed(&self, feed: &Feed) {
        let result = codec::encode_feed(feed)
            .and_then(|data| self.store.save_parsed_feed(&feed.url, &data));
        if let Err(e) = result {
            tracing::warn!("Failed to cache parsed feed {}: {}", feed.url, e);
        }
    }

    fn cached_feed(&self, url: &str) -> Option<Feed> {
        match self.store.load_parsed_feed(url) {
            Ok(Some(data)) => self.decode_cached(url, &data),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Parsed cache read failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Undecodable entries count as a miss.
    pub(crate) fn decode_cached(&self, url: &str, data: &[u8]) -> Option<Feed> {
        match codec::decode_feed(data) {
            Ok(mut feed) => {
                tracing::debug!("Parsed cache hit for {}", url);
                feed.url = url.to_string();
                Some(feed)
            }
            Err(e) => {
                tracing::debug!("Discarding cached feed {}: {}", url, e);
                None
            }
        }
    }

    pub fn should_prefer_cache(&self) -> bool {
        self.should_prefer_cache_at(Utc::now())
    }

    /// True when the last full fetch happened within the freshness window
    /// before `now`.
    pub fn should_prefer_cache_at(&self, now: DateTime<Utc>) -> bool {
        match self.store.last_fetch_time() {
            Ok(Some(last)) => now.signed_duration_since(last) <= Duration::hours(FRESHNESS_WINDOW_HOURS),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Could not read last fetch time: {}", e);
                false
            }
        }
    }

    pub(crate) fn mark_fetched_now(&self) {
        if let Err(e) = self.store.set_last_fetch_time(Utc::now()) {
            tracing::warn!("Failed to record fetch time: {}", e);
        }
    }

    /// Re-fetch one feed from the network and swap it in place. Pending
    /// read flags of the old copy are written first so none are lost.
    pub async fn refresh_feed(&self, feeds: &mut Feeds, index: usize) -> Result<()> {
        let old = feeds.get(index).ok_or(RilletError::FeedNotFound(index))?;
        let url = old.url.clone();
        let position = old.position;

        let pending: Vec<_> = feeds.read_statuses().into_iter().filter(|s| s.feed_url == url).collect();
        self.store.save_read_statuses(&pending)?;

        let mut feed = self.load_feed(&url, false).await;
        feed.position = position;
        let statuses = self.store.load_read_statuses()?;
        tracking::reconcile_feed(&mut feed, &statuses);

        feeds[index] = feed;
        Ok(())
    }
}
