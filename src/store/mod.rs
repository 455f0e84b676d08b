pub mod codec;
pub mod sqlite;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::ReadStatus;

pub use sqlite::SqliteStore;

pub trait Store {
    // Read tracking
    fn save_read_statuses(&self, statuses: &[ReadStatus]) -> Result<()>;
    fn save_read_status(&self, status: &ReadStatus) -> Result<()>;
    fn load_read_statuses(&self) -> Result<HashMap<String, bool>>;

    // Cache metadata
    fn last_fetch_time(&self) -> Result<Option<DateTime<Utc>>>;
    fn set_last_fetch_time(&self, at: DateTime<Utc>) -> Result<()>;

    // Raw feed documents
    fn save_raw_feed(&self, url: &str, content: &[u8]) -> Result<()>;
    fn load_raw_feed(&self, url: &str) -> Result<Option<Vec<u8>>>;

    // Parsed feeds, already encoded by the caller
    fn save_parsed_feed(&self, url: &str, data: &[u8]) -> Result<()>;
    fn load_parsed_feed(&self, url: &str) -> Result<Option<Vec<u8>>>;
    fn load_all_parsed_feeds(&self) -> Result<HashMap<String, Vec<u8>>>;

    /// Drop every cached document and the fetch timestamp. Read flags stay.
    fn clear_caches(&self) -> Result<()>;
}
