//! Scripted [`Fetcher`] double for loader and tracking tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{Result, RilletError};
use crate::fetcher::Fetcher;

#[derive(Clone)]
enum Reply {
    Body(Vec<u8>),
    Fail(String),
}

#[derive(Clone)]
struct Script {
    reply: Reply,
    delay: Duration,
}

#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
    per_url: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set_body(url, body);
        self
    }

    pub fn respond_after(self, url: &str, body: impl Into<Vec<u8>>, delay: Duration) -> Self {
        self.set(url, Reply::Body(body.into()), delay);
        self
    }

    pub fn fail(self, url: &str, reason: &str) -> Self {
        self.set(url, Reply::Fail(reason.to_string()), Duration::ZERO);
        self
    }

    /// Replace the reply for `url` after construction.
    pub fn set_body(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.set(url, Reply::Body(body.into()), Duration::ZERO);
    }

    fn set(&self, url: &str, reply: Reply, delay: Duration) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), Script { reply, delay });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.per_url.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_url
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        let script = self.scripts.lock().unwrap().get(url).cloned();
        let Some(script) = script else {
            return Err(RilletError::Other(format!("no script for {}", url)));
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.reply {
            Reply::Body(body) => Ok(body),
            Reply::Fail(reason) => Err(RilletError::Other(reason)),
        }
    }
}

/// Minimal RSS 2.0 document with one item per `(guid, title)` pair.
pub fn rss(title: &str, items: &[(&str, &str)]) -> Vec<u8> {
    let mut doc = format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>{}</title>",
        title
    );
    for (guid, item_title) in items {
        doc.push_str(&format!(
            "<item><title>{}</title><guid>{}</guid><description>Body of {}</description></item>",
            item_title, guid, item_title
        ));
    }
    doc.push_str("</channel></rss>");
    doc.into_bytes()
}
