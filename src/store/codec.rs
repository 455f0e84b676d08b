//! Serialized form of a parsed feed in the `parsed_feed_cache` table.
//!
//! Entries carry a format version; anything that does not decode under the
//! current version is reported as [`RilletError::CacheFormat`] and callers
//! treat it as a cache miss.

use serde::{Deserialize, Serialize};

use crate::app::{Result, RilletError};
use crate::domain::Feed;

pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CachedFeedRef<'a> {
    version: u32,
    feed: &'a Feed,
}

#[derive(Deserialize)]
struct CachedFeed {
    version: u32,
    feed: Feed,
}

#[derive(Deserialize)]
struct VersionOnly {
    version: u32,
}

pub fn encode_feed(feed: &Feed) -> Result<Vec<u8>> {
    let envelope = CachedFeedRef {
        version: CACHE_FORMAT_VERSION,
        feed,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

pub fn decode_feed(data: &[u8]) -> Result<Feed> {
    let header: VersionOnly = serde_json::from_slice(data)
        .map_err(|e| RilletError::CacheFormat(e.to_string()))?;
    if header.version != CACHE_FORMAT_VERSION {
        return Err(RilletError::CacheFormat(format!(
            "unsupported cache version {} (expected {})",
            header.version, CACHE_FORMAT_VERSION
        )));
    }

    let cached: CachedFeed =
        serde_json::from_slice(data).map_err(|e| RilletError::CacheFormat(e.to_string()))?;
    let mut feed = cached.feed;
    feed.index_posts();
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;

    fn sample_feed() -> Feed {
        let mut post = Post::new("guid-1", "Hello", "<p>Body</p>");
        post.link = Some("https://example.com/1".into());
        post.published = "01/02/2024".into();
        Feed::new(
            "https://example.com/feed.xml",
            "Example",
            vec![post, Post::new("guid-2", "Second", "More")],
        )
    }

    #[test]
    fn test_decode_restores_positions_and_clears_read() {
        let mut feed = sample_feed();
        feed.posts[1].read = true;

        let decoded = decode_feed(&encode_feed(&feed).unwrap()).unwrap();

        assert_eq!(decoded.url, feed.url);
        assert_eq!(decoded.title, "Example");
        assert_eq!(decoded.posts.len(), 2);
        assert_eq!(decoded.posts[1].position, 1);
        assert_eq!(decoded.posts[0].link.as_deref(), Some("https://example.com/1"));
        // Read flags are not part of the cached form
        assert!(!decoded.posts[1].read);
    }

    #[test]
    fn test_version_mismatch_is_cache_format_error() {
        let data = br#"{"version":0,"feed":{"title":"t","url":"u","posts":[]}}"#;
        assert!(matches!(
            decode_feed(data),
            Err(RilletError::CacheFormat(_))
        ));
    }

    #[test]
    fn test_garbage_is_cache_format_error() {
        assert!(matches!(
            decode_feed(b"\x00\x01not json"),
            Err(RilletError::CacheFormat(_))
        ));
        // Valid version, broken payload
        assert!(matches!(
            decode_feed(br#"{"version":1,"feed":{"title":5}}"#),
            Err(RilletError::CacheFormat(_))
        ));
    }
}
