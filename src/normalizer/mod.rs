pub mod date;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser::{self, Parser};
use html_escape::decode_html_entities;

use crate::app::{Result, RilletError};
use crate::domain::{Feed, Post};

use self::date::{convert_date, format_date};

/// Feed parser adapter: raw RSS/Atom/JSON Feed bytes into a domain [`Feed`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    date_format: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("%d/%m/%Y")
    }
}

impl Normalizer {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    fn parser(raw_dates: &RawDates) -> Parser {
        let hook = raw_dates.clone();
        parser::Builder::new()
            .timestamp_parser(move |text| hook.parse(text))
            .build()
    }

    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<Feed> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(RilletError::FeedParse("empty document".into()));
        }

        let raw_dates = RawDates::default();
        let parsed = Self::parser(&raw_dates)
            .parse(body)
            .map_err(|e| RilletError::FeedParse(e.to_string()))?;

        let title = parsed
            .title
            .map(|t| decode_html_entities(&t.content).trim().to_string())
            .unwrap_or_default();

        let posts = parsed
            .entries
            .into_iter()
            .map(|entry| self.to_post(entry, &raw_dates))
            .collect();

        Ok(Feed::new(feed_url, title, posts))
    }

    fn to_post(&self, entry: Entry, raw_dates: &RawDates) -> Post {
        let title = entry
            .title
            .map(|t| decode_html_entities(&t.content).trim().to_string())
            .unwrap_or_default();

        let content = entry
            .content
            .and_then(|c| c.body)
            .filter(|body| !body.trim().is_empty())
            .or_else(|| entry.summary.map(|s| s.content))
            .unwrap_or_default();

        let mut post = Post::new(entry.id, title, content);
        post.link = entry.links.first().map(|l| l.href.clone());
        match entry.published.or(entry.updated).map(|dt| raw_dates.resolve(dt)) {
            Some(Ok(dt)) => {
                post.published_at = Some(dt);
                post.published = format_date(&dt, &self.date_format);
            }
            Some(Err(raw)) => post.published = convert_date(&raw, &self.date_format),
            None => {}
        }
        post
    }
}

/// 0001-01-01T00:00:00Z
const RAW_DATE_BASE: i64 = -62_135_596_800;

/// Date texts no known layout understood.
///
/// feed-rs keeps only parsed timestamps, so an unparsed text is returned to
/// it as a placeholder instant `RAW_DATE_BASE + n` where `n` indexes this
/// list, and [`RawDates::resolve`] maps it back.
#[derive(Debug, Clone, Default)]
struct RawDates(Rc<RefCell<Vec<String>>>);

impl RawDates {
    fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        if let Some(dt) = date::parse_date(text) {
            return Some(dt);
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut raw = self.0.borrow_mut();
        raw.push(text.to_string());
        DateTime::from_timestamp(RAW_DATE_BASE + (raw.len() as i64 - 1), 0)
    }

    /// The real instant, or the raw text a placeholder stands for.
    fn resolve(&self, dt: DateTime<Utc>) -> std::result::Result<DateTime<Utc>, String> {
        let raw = self.0.borrow();
        let slot = dt.timestamp() - RAW_DATE_BASE;
        match usize::try_from(slot).ok().and_then(|i| raw.get(i)) {
            Some(text) if dt.timestamp_subsec_nanos() == 0 => Err(text.clone()),
            _ => Ok(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NO_CONTENT_PLACEHOLDER;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test &amp; Feed</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
    </item>
    <item>
      <title>Test Item 3</title>
      <guid>item-3</guid>
      <pubDate>Tuesday, 02-Jan-24 10:00:00 CET</pubDate>
      <description>   </description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <id>urn:test</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-05T12:00:00Z</updated>
    <summary>Summary only</summary>
    <content type="html">&lt;p&gt;Full body&lt;/p&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let normalizer = Normalizer::new("%d/%m/%Y");
        let feed = normalizer
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(feed.title, "Test & Feed");
        assert_eq!(feed.url, "https://example.com/feed.xml");
        assert_eq!(feed.posts.len(), 3);
        assert_eq!(feed.posts[0].id, "item-1");
        assert_eq!(feed.posts[0].title, "Test Item 1");
        assert_eq!(feed.posts[0].link.as_deref(), Some("https://example.com/item1"));
        assert_eq!(feed.posts[0].content, "This is item 1");
        assert_eq!(feed.posts[0].published, "01/01/2024");
        assert!(!feed.posts[0].read);
    }

    #[test]
    fn test_content_never_empty() {
        let normalizer = Normalizer::default();
        let feed = normalizer
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert!(feed.posts.iter().all(|p| !p.content.is_empty()));
        assert_eq!(feed.posts[1].content, NO_CONTENT_PLACEHOLDER);
        assert_eq!(feed.posts[2].content, NO_CONTENT_PLACEHOLDER);
    }

    #[test]
    fn test_positions_follow_document_order() {
        let feed = Normalizer::default()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();
        let positions: Vec<usize> = feed.posts.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_tolerant_dates_reach_posts() {
        let feed = Normalizer::new("%Y-%m-%d")
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();
        assert_eq!(feed.posts[2].published, "2024-01-02");
        assert!(feed.posts[1].published_at.is_none());
        assert_eq!(feed.posts[1].published, "");
    }

    #[test]
    fn test_parse_atom_prefers_content_over_summary() {
        let normalizer = Normalizer::new("%Y-%m-%d");
        let feed = normalizer
            .normalize("https://example.com/feed.atom", ATOM_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(feed.title, "Atom Test Feed");
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].id, "atom-entry-1");
        assert_eq!(feed.posts[0].content, "<p>Full body</p>");
        assert_eq!(feed.posts[0].published, "2024-01-05");
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let normalizer = Normalizer::default();
        let err = normalizer
            .normalize("https://example.com/feed.xml", b"<html><body>nope</body></html>")
            .unwrap_err();
        assert!(matches!(err, RilletError::FeedParse(_)));

        let err = normalizer
            .normalize("https://example.com/feed.xml", b"  \n ")
            .unwrap_err();
        assert!(matches!(err, RilletError::FeedParse(_)));
    }

    #[test]
    fn test_unparseable_date_keeps_raw_text() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Dates</title>
    <item>
      <guid>vague</guid>
      <title>Vague</title>
      <pubDate>sometime last week</pubDate>
      <description>x</description>
    </item>
    <item>
      <guid>spaced</guid>
      <title>Spaced</title>
      <pubDate>2024-03-05 10:20:30</pubDate>
      <description>y</description>
    </item>
    <item>
      <guid>plain</guid>
      <title>Plain</title>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>z</description>
    </item>
  </channel>
</rss>"#;

        let feed = Normalizer::new("%d/%m/%Y")
            .normalize("https://example.com/feed.xml", rss.as_bytes())
            .unwrap();

        assert_eq!(feed.posts[0].published, "sometime last week");
        assert!(feed.posts[0].published_at.is_none());
        assert_eq!(feed.posts[1].published, "05/03/2024");
        assert!(feed.posts[1].published_at.is_some());
        assert_eq!(feed.posts[2].published, "01/01/2024");
    }
}
