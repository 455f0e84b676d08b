//! Overlay of persisted read flags onto loaded feeds, keyed by post
//! identifier, and the write path back to the store.

use std::collections::HashMap;

use crate::app::Result;
use crate::domain::{Feed, Feeds};
use crate::store::Store;

/// Apply persisted read flags to every post. One bulk read from the store.
pub fn reconcile(feeds: &mut Feeds, store: &dyn Store) -> Result<()> {
    let statuses = store.load_read_statuses()?;
    for feed in feeds.iter_mut() {
        reconcile_feed(feed, &statuses);
    }
    tracing::debug!(
        "Reconciled {} posts against {} stored statuses",
        feeds.total_posts(),
        statuses.len()
    );
    Ok(())
}

/// Posts without an identifier, or never recorded, keep their current flag.
pub fn reconcile_feed(feed: &mut Feed, statuses: &HashMap<String, bool>) {
    for post in feed.posts.iter_mut().filter(|p| p.is_trackable()) {
        if let Some(&read) = statuses.get(&post.id) {
            post.read = read;
        }
    }
}

/// Persist the read flag of every trackable post in one transaction.
pub fn write_tracking(feeds: &Feeds, store: &dyn Store) -> Result<()> {
    let statuses = feeds.read_statuses();
    store.save_read_statuses(&statuses)?;
    tracing::debug!("Wrote {} read statuses", statuses.len());
    Ok(())
}
