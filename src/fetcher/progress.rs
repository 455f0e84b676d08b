use crate::domain::{Feed, Feeds};
use crate::fetcher::LoadEvent;
use crate::store::Store;
use crate::tracking;

/// Single owner of the feeds arriving from a background load.
///
/// Feeds are kept in completion order until the load finishes; the final
/// sort and read-state reconciliation happen exactly once.
pub struct FeedAggregator {
    urls: Vec<String>,
    partial: Vec<Feed>,
    loaded: usize,
    total: usize,
}

impl FeedAggregator {
    pub fn new(urls: Vec<String>) -> Self {
        let total = urls.len();
        Self {
            urls,
            partial: Vec::with_capacity(total),
            loaded: 0,
            total,
        }
    }

    /// Feed one event in. Returns the finished, reconciled collection when
    /// the load completes.
    pub fn apply(&mut self, event: LoadEvent, store: &dyn Store) -> Option<Feeds> {
        match event {
            LoadEvent::FeedLoaded { feed, loaded, total } => {
                self.partial.push(feed);
                self.loaded = loaded;
                self.total = total;
                None
            }
            LoadEvent::AllLoaded => {
                let feeds = std::mem::take(&mut self.partial).into();
                Some(self.finish(feeds, store))
            }
            LoadEvent::BatchLoaded(feeds) => {
                self.loaded = feeds.len();
                Some(self.finish(feeds, store))
            }
        }
    }

    fn finish(&mut self, mut feeds: Feeds, store: &dyn Store) -> Feeds {
        feeds.sort_by_urls(&self.urls);
        if let Err(e) = tracking::reconcile(&mut feeds, store) {
            tracing::warn!("Failed to reconcile read state: {}", e);
        }
        feeds
    }

    /// Feeds received so far, in completion order.
    pub fn partial(&self) -> &[Feed] {
        &self.partial
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.loaded, self.total)
    }

}
