//! Test doubles shared by the scan module tests

use crate::feed::{FeedError, FeedPage, Gist, GistFeed, GistFile};
use crate::scan::cycle::Clock;
use crate::scan::inspector::{InspectError, KeywordInspector, LineNumbers, SecretInspector};
use crate::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Fixed instant `secs` after an arbitrary epoch
pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn open_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("gistwatch.db"), Duration::from_secs(1), t(0)).unwrap();
    (dir, store)
}

pub fn keyword_inspector() -> Arc<dyn SecretInspector> {
    Arc::new(KeywordInspector::new(&["secret", "password"], &[] as &[&str]).unwrap())
}

/// Keyword inspector that fails on any content containing `marker`
pub struct BrittleInspector {
    marker: &'static str,
    inner: Arc<dyn SecretInspector>,
}

impl BrittleInspector {
    pub fn new(marker: &'static str) -> Self {
        Self {
            marker,
            inner: keyword_inspector(),
        }
    }
}

#[async_trait]
impl SecretInspector for BrittleInspector {
    async fn inspect(&self, content: &str) -> Result<LineNumbers, InspectError> {
        if content.contains(self.marker) {
            return Err(InspectError::Malformed(format!("choked on {}", self.marker)));
        }
        self.inner.inspect(content).await
    }

    fn name(&self) -> &'static str {
        "brittle"
    }
}

/// A gist whose files have raw URLs of the form `<id>/<filename>`
pub fn gist(id: &str, files: &[&str]) -> Gist {
    Gist {
        id: id.to_string(),
        html_url: format!("https://gist.github.com/{id}"),
        files: files
            .iter()
            .map(|name| GistFile {
                name: name.to_string(),
                filename: name.to_string(),
                raw_url: format!("{id}/{name}"),
                size: None,
            })
            .collect(),
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory feed that records every call it receives
#[derive(Default)]
pub struct FakeFeed {
    gists: Vec<Gist>,
    malformed: usize,
    fail_listing: bool,
    raw: HashMap<String, Option<String>>,
    since_calls: Mutex<Vec<DateTime<Utc>>>,
    raw_calls: Mutex<Vec<String>>,
}

impl FakeFeed {
    pub fn new(gists: Vec<Gist>) -> Self {
        Self {
            gists,
            ..Default::default()
        }
    }

    /// A feed whose listing endpoint always fails
    pub fn failing() -> Self {
        Self {
            fail_listing: true,
            ..Default::default()
        }
    }

    pub fn with_raw(mut self, raw_url: &str, content: &str) -> Self {
        self.raw.insert(raw_url.to_string(), Some(content.to_string()));
        self
    }

    pub fn with_failing_raw(mut self, raw_url: &str) -> Self {
        self.raw.insert(raw_url.to_string(), None);
        self
    }

    pub fn with_malformed(mut self, malformed: usize) -> Self {
        self.malformed = malformed;
        self
    }

    pub fn since_calls(&self) -> Vec<DateTime<Utc>> {
        self.since_calls.lock().unwrap().clone()
    }

    pub fn raw_calls(&self) -> Vec<String> {
        self.raw_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GistFeed for FakeFeed {
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<FeedPage, FeedError> {
        self.since_calls.lock().unwrap().push(since);
        if self.fail_listing {
            return Err(FeedError::Status {
                url: "fake://gists/public".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(FeedPage {
            gists: self.gists.clone(),
            malformed: self.malformed,
            ..Default::default()
        })
    }

    async fn fetch_raw(&self, file: &GistFile) -> Result<String, FeedError> {
        self.raw_calls.lock().unwrap().push(file.raw_url.clone());
        match self.raw.get(&file.raw_url) {
            Some(Some(content)) => Ok(content.clone()),
            _ => Err(FeedError::Status {
                url: file.raw_url.clone(),
                status: 500,
                body: "boom".to_string(),
            }),
        }
    }
}
