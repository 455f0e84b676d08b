use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Substituted when an entry carries neither content nor a description.
pub const NO_CONTENT_PLACEHOLDER: &str =
    "This post does not contain any content.\nPress \"o\" to open the post in your preferred browser";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Feed-native identifier (RSS guid, Atom id). May be empty.
    pub id: String,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
    /// Publication date rendered in the configured display format, or the
    /// raw feed text when it could not be parsed.
    pub published: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Position within the parent feed, assigned at load time.
    #[serde(skip)]
    pub position: usize,
    /// Read flags live in the store, never in the parsed cache.
    #[serde(skip)]
    pub read: bool,
}

impl Post {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: ensure_content(content.into()),
            link: None,
            published: String::new(),
            published_at: None,
            position: 0,
            read: false,
        }
    }

    /// Whether this post can take part in read tracking.
    pub fn is_trackable(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Bullet shown next to unread posts.
    pub fn read_symbol(&self) -> &'static str {
        if self.read {
            " "
        } else {
            "•"
        }
    }
}

/// Returns `content`, or the placeholder when it is blank.
pub fn ensure_content(content: String) -> String {
    if content.trim().is_empty() {
        NO_CONTENT_PLACEHOLDER.to_string()
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_content_gets_placeholder() {
        let post = Post::new("guid-1", "Title", "   \n\t");
        assert_eq!(post.content, NO_CONTENT_PLACEHOLDER);
    }

    #[test]
    fn test_content_kept_when_present() {
        let post = Post::new("guid-1", "Title", "<p>Body</p>");
        assert_eq!(post.content, "<p>Body</p>");
    }

    #[test]
    fn test_display_title_fallback() {
        let post = Post::new("guid-1", "", "Body");
        assert_eq!(post.display_title(), "(Untitled)");

        let post = Post::new("guid-1", "Hello", "Body");
        assert_eq!(post.display_title(), "Hello");
    }

    #[test]
    fn test_empty_id_is_not_trackable() {
        assert!(!Post::new("", "Title", "Body").is_trackable());
        assert!(Post::new("guid", "Title", "Body").is_trackable());
    }

    #[test]
    fn test_read_symbol() {
        let mut post = Post::new("guid", "Title", "Body");
        assert_eq!(post.read_symbol(), "•");
        post.read = true;
        assert_eq!(post.read_symbol(), " ");
    }
}
