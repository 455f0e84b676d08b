use serde::{Deserialize, Serialize};

/// Durable read flag for one post, keyed by the post identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadStatus {
    pub identifier: String,
    pub feed_url: String,
    pub read: bool,
}

impl ReadStatus {
    pub fn new(identifier: &str, feed_url: &str, read: bool) -> Self {
        Self {
            identifier: identifier.to_string(),
            feed_url: feed_url.to_string(),
            read,
        }
    }
}
