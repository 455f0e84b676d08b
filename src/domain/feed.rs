use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::app::{Result, RilletError};
use crate::domain::{Post, ReadStatus};
use crate::normalizer::date::newest_first;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    /// Subscription key; joins every cache table.
    pub url: String,
    pub posts: Vec<Post>,
    /// Index within the configured URL list.
    #[serde(skip)]
    pub position: usize,
    /// Set on placeholder feeds produced by a failed load.
    #[serde(skip)]
    pub error: Option<String>,
}

impl Feed {
    pub fn new(url: impl Into<String>, title: impl Into<String>, posts: Vec<Post>) -> Self {
        let mut feed = Self {
            title: title.into(),
            url: url.into(),
            posts,
            position: 0,
            error: None,
        };
        feed.index_posts();
        feed
    }

    /// Placeholder for a feed that could not be loaded. It has no posts and
    /// its title carries the failure so the user can still navigate to it.
    pub fn error(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        let url = url.into();
        Self {
            title: format!("Error loading {}", url),
            url,
            posts: Vec::new(),
            position: 0,
            error: Some(reason.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Assign each post its ordinal position in this feed.
    pub fn index_posts(&mut self) {
        for (i, post) in self.posts.iter_mut().enumerate() {
            post.position = i;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.posts.iter().filter(|p| !p.read).count()
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// Addresses one post inside a [`Feeds`] collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRef {
    pub feed: usize,
    pub post: usize,
}

/// Feeds in configured URL order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feeds(Vec<Feed>);

impl Feeds {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_inner(self) -> Vec<Feed> {
        self.0
    }

    /// Reorder to match `urls`, assigning each feed its configured position.
    /// Feeds whose URL is not configured keep their relative order at the end.
    pub fn sort_by_urls(&mut self, urls: &[String]) {
        let mut order: HashMap<&str, usize> = HashMap::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            order.entry(url.as_str()).or_insert(i);
        }

        self.0
            .sort_by_key(|feed| order.get(feed.url.as_str()).copied().unwrap_or(usize::MAX));

        for feed in self.0.iter_mut() {
            if let Some(&pos) = order.get(feed.url.as_str()) {
                feed.position = pos;
            }
        }
    }

    pub fn total_unread(&self) -> usize {
        self.0.iter().map(Feed::unread_count).sum()
    }

    pub fn total_posts(&self) -> usize {
        self.0.iter().map(|f| f.posts.len()).sum()
    }

    pub fn post(&self, at: PostRef) -> Option<&Post> {
        self.0.get(at.feed).and_then(|f| f.posts.get(at.post))
    }

    fn post_mut(&mut self, feed: usize, post: usize) -> Result<&mut Post> {
        self.0
            .get_mut(feed)
            .and_then(|f| f.posts.get_mut(post))
            .ok_or(RilletError::PostNotFound { feed, post })
    }

    /// Flip a post's read flag, returning the new value.
    pub fn toggle_read(&mut self, feed: usize, post: usize) -> Result<bool> {
        let post = self.post_mut(feed, post)?;
        post.read = !post.read;
        Ok(post.read)
    }

    /// Mark a single post read. Returns whether the flag changed.
    pub fn mark_read(&mut self, feed: usize, post: usize) -> Result<bool> {
        let post = self.post_mut(feed, post)?;
        let changed = !post.read;
        post.read = true;
        Ok(changed)
    }

    /// Mark every post of one feed read. Returns how many flags changed.
    pub fn mark_all_read(&mut self, feed: usize) -> Result<usize> {
        let feed = self.0.get_mut(feed).ok_or(RilletError::FeedNotFound(feed))?;
        let mut changed = 0;
        for post in feed.posts.iter_mut().filter(|p| !p.read) {
            post.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    /// Read flags for every trackable post, ready for a batch write.
    pub fn read_statuses(&self) -> Vec<ReadStatus> {
        let mut statuses = Vec::with_capacity(self.total_posts());
        for feed in &self.0 {
            for post in feed.posts.iter().filter(|p| p.is_trackable()) {
                statuses.push(ReadStatus::new(&post.id, &feed.url, post.read));
            }
        }
        statuses
    }

    /// Every post across all feeds, newest first. Posts without a date sort
    /// last and ties keep feed order.
    pub fn mixed(&self) -> Vec<PostRef> {
        let mut refs = self.all_posts();
        refs.sort_by(|a, b| match (self.post(*a), self.post(*b)) {
            (Some(a), Some(b)) => newest_first(a, b),
            _ => std::cmp::Ordering::Equal,
        });
        refs
    }

    /// Case-insensitive substring match over post title and content.
    pub fn search(&self, query: &str) -> Vec<PostRef> {
        let needle = query.to_lowercase();
        self.all_posts()
            .into_iter()
            .filter(|at| {
                self.post(*at).is_some_and(|p| {
                    p.content.to_lowercase().contains(&needle)
                        || p.title.to_lowercase().contains(&needle)
                })
            })
            .collect()
    }

    /// Posts of a single feed in their native order.
    pub fn feed_posts(&self, feed: usize) -> Vec<PostRef> {
        self.0
            .get(feed)
            .map(|f| (0..f.posts.len()).map(|post| PostRef { feed, post }).collect())
            .unwrap_or_default()
    }

    fn all_posts(&self) -> Vec<PostRef> {
        self.0
            .iter()
            .enumerate()
            .flat_map(|(feed, f)| (0..f.posts.len()).map(move |post| PostRef { feed, post }))
            .collect()
    }
}

impl From<Vec<Feed>> for Feeds {
    fn from(feeds: Vec<Feed>) -> Self {
        Self(feeds)
    }
}

impl FromIterator<Feed> for Feeds {
    fn from_iter<I: IntoIterator<Item = Feed>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Feeds {
    type Item = Feed;
    type IntoIter = std::vec::IntoIter<Feed>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Deref for Feeds {
    type Target = Vec<Feed>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Feeds {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn feed(url: &str, ids: &[&str]) -> Feed {
        let posts = ids
            .iter()
            .map(|id| Post::new(*id, format!("Title {}", id), format!("Body {}", id)))
            .collect();
        Feed::new(url, url, posts)
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_assigns_post_positions() {
        let f = feed("https://a.example/feed", &["x", "y", "z"]);
        let positions: Vec<usize> = f.posts.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_error_feed_has_no_posts() {
        let f = Feed::error("https://a.example/feed", "connection refused");
        assert!(f.posts.is_empty());
        assert!(f.is_error());
        assert!(f.title.contains("Error loading"));
        assert!(f.title.contains("https://a.example/feed"));
    }

    #[test]
    fn test_sort_by_urls_follows_configuration() {
        let mut feeds: Feeds = vec![
            feed("https://c.example", &[]),
            feed("https://a.example", &[]),
            feed("https://b.example", &[]),
        ]
        .into();
        let order = urls(&["https://a.example", "https://b.example", "https://c.example"]);

        feeds.sort_by_urls(&order);

        let got: Vec<&str> = feeds.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(got, vec!["https://a.example", "https://b.example", "https://c.example"]);
        let positions: Vec<usize> = feeds.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_sort_by_urls_puts_unknown_last() {
        let mut feeds: Feeds = vec![
            feed("https://stray.example", &[]),
            feed("https://b.example", &[]),
            feed("https://a.example", &[]),
        ]
        .into();

        feeds.sort_by_urls(&urls(&["https://a.example", "https://b.example"]));

        assert_eq!(feeds[0].url, "https://a.example");
        assert_eq!(feeds[1].url, "https://b.example");
        assert_eq!(feeds[2].url, "https://stray.example");
    }

    #[test]
    fn test_toggle_and_mark_read() {
        let mut feeds: Feeds = vec![feed("https://a.example", &["1", "2"])].into();

        assert!(feeds.toggle_read(0, 1).unwrap());
        assert!(feeds[0].posts[1].read);
        assert!(!feeds.toggle_read(0, 1).unwrap());
        assert!(!feeds[0].posts[1].read);

        assert!(feeds.mark_read(0, 0).unwrap());
        // Second call is a no-op
        assert!(!feeds.mark_read(0, 0).unwrap());
        assert!(feeds[0].posts[0].read);
    }

    #[test]
    fn test_mark_all_read() {
        let mut feeds: Feeds = vec![
            feed("https://a.example", &["1", "2", "3"]),
            feed("https://b.example", &["4"]),
        ]
        .into();
        feeds.mark_read(0, 1).unwrap();

        assert_eq!(feeds.mark_all_read(0).unwrap(), 2);
        assert_eq!(feeds[0].unread_count(), 0);
        assert_eq!(feeds[1].unread_count(), 1);
        assert_eq!(feeds.total_unread(), 1);
    }

    #[test]
    fn test_out_of_range_mutations_error() {
        let mut feeds: Feeds = vec![feed("https://a.example", &["1"])].into();
        assert!(matches!(
            feeds.toggle_read(0, 5),
            Err(RilletError::PostNotFound { feed: 0, post: 5 })
        ));
        assert!(matches!(
            feeds.mark_all_read(3),
            Err(RilletError::FeedNotFound(3))
        ));
    }

    #[test]
    fn test_read_statuses_skip_empty_ids() {
        let mut feeds: Feeds = vec![feed("https://a.example", &["1", "", "3"])].into();
        feeds.mark_read(0, 0).unwrap();

        let statuses = feeds.read_statuses();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0], ReadStatus::new("1", "https://a.example", true));
        assert_eq!(statuses[1], ReadStatus::new("3", "https://a.example", false));
    }

    #[test]
    fn test_mixed_is_newest_first_with_undated_last() {
        let mut a = feed("https://a.example", &["old", "undated"]);
        a.posts[0].published_at = Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        let mut b = feed("https://b.example", &["new"]);
        b.posts[0].published_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let feeds: Feeds = vec![a, b].into();

        let mixed = feeds.mixed();
        let ids: Vec<&str> = mixed
            .iter()
            .map(|at| feeds.post(*at).unwrap().id.as_str())
            .collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert_eq!(mixed[0], PostRef { feed: 1, post: 0 });
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut feeds: Feeds = vec![feed("https://a.example", &["1", "2"])].into();
        feeds[0].posts[1].content = "All about RUST ownership".into();

        let hits = feeds.search("rust");
        assert_eq!(hits, vec![PostRef { feed: 0, post: 1 }]);
        assert!(feeds.search("nothing-matches").is_empty());
    }
}
