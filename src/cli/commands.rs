use crate::app::{AppContext, Result, RilletError};
use crate::config::ConfigError;
use crate::domain::Feeds;
use crate::store::Store;
use crate::tracking;

fn require_urls(ctx: &AppContext) -> Result<&[String]> {
    if ctx.urls.is_empty() {
        return Err(RilletError::Config(ConfigError::NoUrls.to_string()));
    }
    Ok(&ctx.urls)
}

/// One load (cached when fresh enough) followed by reconciliation.
pub async fn load_reconciled(ctx: &AppContext) -> Result<Feeds> {
    let urls = require_urls(ctx)?;
    let prefer_cache = ctx.loader.should_prefer_cache();

    let mut feeds = ctx.loader.load_all(urls, prefer_cache).await;
    tracking::reconcile(&mut feeds, ctx.store.as_ref())?;
    Ok(feeds)
}

pub async fn count_unread(ctx: &AppContext) -> Result<usize> {
    let feeds = load_reconciled(ctx).await?;
    Ok(feeds.total_unread())
}

pub async fn print_unread(ctx: &AppContext) -> Result<()> {
    println!("{}", count_unread(ctx).await?);
    Ok(())
}

/// Fresh fetch of every feed; new posts get a read-state row.
pub async fn update_feeds(ctx: &AppContext) -> Result<Feeds> {
    let urls = require_urls(ctx)?;
    println!("Updating {} feeds...", urls.len());

    let mut feeds = ctx.loader.load_all(urls, false).await;
    tracking::reconcile(&mut feeds, ctx.store.as_ref())?;
    tracking::write_tracking(&feeds, ctx.store.as_ref())?;

    let mut errors = 0;
    for feed in feeds.iter() {
        match &feed.error {
            Some(e) => {
                errors += 1;
                eprintln!("  {}: {}", feed.title, e);
            }
            None => println!(
                "  {} ({} posts, {} unread)",
                feed.display_title(),
                feed.posts.len(),
                feed.unread_count()
            ),
        }
    }

    println!(
        "Update complete: {} posts, {} unread, {} errors",
        feeds.total_posts(),
        feeds.total_unread(),
        errors
    );
    Ok(feeds)
}

pub async fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = load_reconciled(ctx).await?;

    for line in feed_lines(&feeds) {
        println!("{}", line);
    }

    Ok(())
}

fn feed_lines(feeds: &Feeds) -> Vec<String> {
    feeds
        .iter()
        .map(|feed| {
            format!(
                "{:>4}/{:<4} {}\n          {}",
                feed.unread_count(),
                feed.posts.len(),
                feed.display_title(),
                feed.url
            )
        })
        .collect()
}

pub fn clear_cache(ctx: &AppContext) -> Result<()> {
    ctx.store.clear_caches()?;
    println!("Cache cleared");
    Ok(())
}
