use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, RilletError};
use crate::domain::ReadStatus;
use crate::store::Store;

const LAST_FETCH_KEY: &str = "last_fetch_time";

const PRAGMAS: &[&str] = &[
    "PRAGMA journal_mode = WAL",
    "PRAGMA synchronous = NORMAL",
    "PRAGMA cache_size = -64000",
    "PRAGMA temp_store = MEMORY",
    "PRAGMA mmap_size = 268435456",
];

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            RilletError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;

        // Some pragmas answer with a row, so drain rather than execute
        for pragma in PRAGMAS {
            let mut stmt = conn.prepare(pragma)?;
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
        }

        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }
}

impl Store for SqliteStore {
    fn save_read_statuses(&self, statuses: &[ReadStatus]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO post_read_status (identifier, feed_url, read) VALUES (?1, ?2, ?3)
                 ON CONFLICT(identifier) DO UPDATE SET read = excluded.read, feed_url = excluded.feed_url",
            )?;
            for status in statuses.iter().filter(|s| !s.identifier.is_empty()) {
                stmt.execute(params![status.identifier, status.feed_url, status.read])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn save_read_status(&self, status: &ReadStatus) -> Result<()> {
        if status.identifier.is_empty() {
            return Ok(());
        }
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO post_read_status (identifier, feed_url, read) VALUES (?1, ?2, ?3)
             ON CONFLICT(identifier) DO UPDATE SET read = excluded.read, feed_url = excluded.feed_url",
            params![status.identifier, status.feed_url, status.read],
        )?;
        Ok(())
    }

    fn load_read_statuses(&self) -> Result<HashMap<String, bool>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT identifier, read FROM post_read_status")?;
        let statuses = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(statuses)
    }

    fn last_fetch_time(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_metadata WHERE key = ?1",
                params![LAST_FETCH_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|s| Self::parse_datetime(&s)))
    }

    fn set_last_fetch_time(&self, at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cache_metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_FETCH_KEY, at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn save_raw_feed(&self, url: &str, content: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO feed_cache (url, content, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET content = excluded.content, fetched_at = excluded.fetched_at",
            params![url, content, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_raw_feed(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let content = conn
            .query_row(
                "SELECT content FROM feed_cache WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    fn save_parsed_feed(&self, url: &str, data: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO parsed_feed_cache (url, parsed_data, cached_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET parsed_data = excluded.parsed_data, cached_at = excluded.cached_at",
            params![url, data, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_parsed_feed(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let data = conn
            .query_row(
                "SELECT parsed_data FROM parsed_feed_cache WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data)
    }

    fn load_all_parsed_feeds(&self) -> Result<HashMap<String, Vec<u8>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT url, parsed_data FROM parsed_feed_cache")?;
        let feeds = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(feeds)
    }

    fn clear_caches(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM feed_cache", [])?;
        tx.execute("DELETE FROM parsed_feed_cache", [])?;
        tx.execute(
            "DELETE FROM cache_metadata WHERE key = ?1",
            params![LAST_FETCH_KEY],
        )?;
        tx.commit()?;
        Ok(())
    }
}
