use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::domain::{Feed, Feeds};
use crate::fetcher::FeedLoader;

pub const DEFAULT_WORKERS: usize = 20;

/// Progress of a background load, in completion order.
#[derive(Debug)]
pub enum LoadEvent {
    /// One URL finished, successfully or as an error feed.
    FeedLoaded {
        feed: Feed,
        loaded: usize,
        total: usize,
    },
    /// Every URL of a fresh load has reported.
    AllLoaded,
    /// A cache-preferring load finished in one step.
    BatchLoaded(Feeds),
}

impl FeedLoader {
    /// Load every URL and return the feeds in `urls` order.
    ///
    /// With `prefer_cache`, the parsed cache is read in a single batch and
    /// only missing URLs are fetched. Otherwise the fetch timestamp is
    /// recorded first and every URL is fetched under the worker limit.
    pub async fn load_all(&self, urls: &[String], prefer_cache: bool) -> Feeds {
        let mut feeds = if prefer_cache {
            self.load_all_cached(urls).await
        } else {
            self.mark_fetched_now();
            self.fetch_many(urls.to_vec(), false).await
        };

        feeds.sort_by_urls(urls);
        tracing::info!(
            "Loaded {} feeds ({} posts, prefer_cache={})",
            feeds.len(),
            feeds.total_posts(),
            prefer_cache
        );
        feeds
    }

    async fn load_all_cached(&self, urls: &[String]) -> Feeds {
        let mut cached = match self.store().load_all_parsed_feeds() {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Batch cache read failed: {}", e);
                HashMap::new()
            }
        };

        let mut feeds = Vec::with_capacity(urls.len());
        let mut missing = Vec::new();
        for url in urls {
            match cached.remove(url).and_then(|data| self.decode_cached(url, &data)) {
                Some(feed) => feeds.push(feed),
                None => missing.push(url.clone()),
            }
        }

        if !missing.is_empty() {
            tracing::debug!("{} feeds missing from cache", missing.len());
            feeds.extend(self.fetch_many(missing, true).await);
        }

        feeds.into()
    }

    async fn fetch_many(&self, urls: Vec<String>, prefer_cache: bool) -> Feeds {
        let tasks = self.spawn_fetches(urls, prefer_cache);
        let (urls, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();

        join_all(handles)
            .await
            .into_iter()
            .zip(urls)
            .map(|(joined, url)| {
                joined.unwrap_or_else(|e| {
                    tracing::error!("Task join error for {}: {}", url, e);
                    Feed::error(&url, e)
                })
            })
            .collect()
    }

    /// One task per URL; at most `workers` run their fetch at a time.
    fn spawn_fetches(&self, urls: Vec<String>, prefer_cache: bool) -> Vec<(String, JoinHandle<Feed>)> {
        let semaphore = Arc::new(Semaphore::new(self.workers()));

        urls.into_iter()
            .map(|url| {
                let loader = self.clone();
                let semaphore = semaphore.clone();
                let task_url = url.clone();

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    loader.fetch_feed(&task_url, prefer_cache).await
                });

                (url, handle)
            })
            .collect()
    }

    /// Run a load in the background and stream its progress.
    ///
    /// A fresh load emits one `FeedLoaded` per URL followed by `AllLoaded`.
    /// A cache-preferring load emits a single `BatchLoaded`.
    pub fn spawn_load(&self, urls: Vec<String>, prefer_cache: bool) -> mpsc::UnboundedReceiver<LoadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader = self.clone();

        tokio::spawn(async move {
            if prefer_cache {
                let feeds = loader.load_all(&urls, true).await;
                let _ = tx.send(LoadEvent::BatchLoaded(feeds));
                return;
            }

            loader.mark_fetched_now();
            let total = urls.len();
            let mut pending: FuturesUnordered<_> = loader
                .spawn_fetches(urls, false)
                .into_iter()
                .map(|(url, handle)| async move { (url, handle.await) })
                .collect();

            let mut loaded = 0;
            while let Some((url, joined)) = pending.next().await {
                loaded += 1;
                let feed = joined.unwrap_or_else(|e| {
                    tracing::error!("Task join error for {}: {}", url, e);
                    Feed::error(&url, e)
                });
                if tx.send(LoadEvent::FeedLoaded { feed, loaded, total }).is_err() {
                    tracing::debug!("Load receiver dropped");
                    return;
                }
            }

            let _ = tx.send(LoadEvent::AllLoaded);
        });

        rx
    }
}
