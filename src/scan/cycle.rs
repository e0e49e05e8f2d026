//! One pass of the scan-and-checkpoint pipeline
//!
//! A cycle walks these stages in order:
//!
//! 1. **FetchingCheckpoint** - read `last_check`, then take the candidate
//!    checkpoint from the clock *before* asking the feed for anything
//! 2. **FetchingFeed** - one bounded page of gists updated since `last_check`
//! 3. **ProcessingItems** - filter, fetch raw, inspect and record every file
//! 4. **PersistingCheckpoint** - advance `last_check` to the candidate
//!
//! A failure on a single file is logged and counted; the cycle carries on.
//! A failure reading the feed or writing the store aborts the cycle without
//! touching the checkpoint, so the same window is retried next time.

use crate::feed::{FeedError, Gist, GistFeed, GistFile};
use crate::scan::data::CycleStats;
use crate::scan::filters::{FileFilter, FilterDecision};
use crate::scan::inspector::{InspectError, LineNumbers, SecretInspector};
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Source of the candidate checkpoint
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    FetchingCheckpoint,
    FetchingFeed,
    ProcessingItems,
    PersistingCheckpoint,
    ErrorRecovery,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleStage::Idle => "idle",
            CycleStage::FetchingCheckpoint => "fetching checkpoint",
            CycleStage::FetchingFeed => "fetching feed",
            CycleStage::ProcessingItems => "processing items",
            CycleStage::PersistingCheckpoint => "persisting checkpoint",
            CycleStage::ErrorRecovery => "recovering from error",
        };
        f.write_str(name)
    }
}

/// Failure confined to one file of one gist
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to fetch raw content: {0}")]
    Fetch(#[from] FeedError),

    #[error("inspection failed: {0}")]
    Inspect(#[from] InspectError),
}

#[derive(Debug, Error)]
pub enum CycleCause {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A failure that aborts the whole cycle
#[derive(Debug, Error)]
#[error("scan cycle aborted while {stage}: {cause}")]
pub struct CycleError {
    pub stage: CycleStage,
    #[source]
    pub cause: CycleCause,
}

impl CycleError {
    fn at<E: Into<CycleCause>>(stage: CycleStage) -> impl FnOnce(E) -> CycleError {
        move |cause| CycleError {
            stage,
            cause: cause.into(),
        }
    }

    /// Persisted state is missing or unreadable; retrying will not fix it
    pub fn is_contract_violation(&self) -> bool {
        matches!(&self.cause, CycleCause::Store(e) if e.is_contract_violation())
    }
}

enum FileOutcome {
    Clean,
    Flagged(LineNumbers),
    Oversized(u64),
}

/// Everything a cycle needs, handed over at construction
pub struct ScanCycle {
    store: Store,
    feed: Arc<dyn GistFeed>,
    filter: FileFilter,
    inspector: Arc<dyn SecretInspector>,
    clock: Arc<dyn Clock>,
    max_file_bytes: u64,
}

impl ScanCycle {
    pub fn new(
        store: Store,
        feed: Arc<dyn GistFeed>,
        filter: FileFilter,
        inspector: Arc<dyn SecretInspector>,
    ) -> Self {
        Self {
            store,
            feed,
            filter,
            inspector,
            clock: Arc::new(SystemClock),
            max_file_bytes: u64::MAX,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run a single cycle from checkpoint read to checkpoint write
    pub async fn run_once(&self) -> Result<CycleStats, CycleError> {
        let started = Instant::now();
        let mut stats = CycleStats::new();

        let checkpoint = self
            .store
            .call(|s| s.get_checkpoint())
            .await
            .map_err(CycleError::at(CycleStage::FetchingCheckpoint))?;
        let candidate = self.clock.now();
        tracing::debug!(stage = %CycleStage::FetchingCheckpoint, "Scanning gists updated since {}", checkpoint);

        let page = self
            .feed
            .fetch_since(checkpoint)
            .await
            .map_err(CycleError::at(CycleStage::FetchingFeed))?;

        let rate = page.rate_limit;
        if let Some(remaining) = rate.remaining {
            tracing::info!(
                remaining,
                limit = rate.limit.unwrap_or_default(),
                reset = rate.reset.unwrap_or_default(),
                "Feed rate limit"
            );
        }
        if page.malformed > 0 || page.malformed_files > 0 {
            tracing::warn!(
                "Skipped {} malformed gists and {} malformed file entries",
                page.malformed,
                page.malformed_files
            );
        }
        tracing::debug!("Fetched {} gists with {} files", page.gists.len(), page.file_count());
        stats.items_fetched = page.gists.len();
        stats.malformed_items = page.malformed;

        for gist in &page.gists {
            self.process_gist(gist, &mut stats)
                .await
                .map_err(CycleError::at(CycleStage::ProcessingItems))?;
        }

        let advanced = self
            .store
            .call(move |s| s.set_checkpoint(candidate))
            .await
            .map_err(CycleError::at(CycleStage::PersistingCheckpoint))?;
        stats.checkpoint_advanced = advanced;
        if !advanced {
            tracing::warn!("Clock has not moved past checkpoint {}, keeping it", checkpoint);
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!("Scan cycle complete: {}", stats);
        Ok(stats)
    }

    async fn process_gist(&self, gist: &Gist, stats: &mut CycleStats) -> Result<(), StoreError> {
        for file in &gist.files {
            stats.files_seen += 1;

            if let FilterDecision::Skip(reason) = self.filter.decide(&file.filename) {
                tracing::debug!(gist_id = %gist.id, file = %file.filename, "Skipped: {}", reason);
                stats.files_filtered += 1;
                continue;
            }

            let lines = match self.inspect_file(file).await {
                Ok(FileOutcome::Clean) => {
                    stats.files_inspected += 1;
                    continue;
                }
                Ok(FileOutcome::Oversized(size)) => {
                    tracing::debug!(gist_id = %gist.id, file = %file.filename, "Skipped: {} bytes is over the limit", size);
                    stats.files_oversized += 1;
                    continue;
                }
                Ok(FileOutcome::Flagged(lines)) => {
                    stats.files_inspected += 1;
                    lines
                }
                Err(e) => {
                    tracing::warn!(gist_id = %gist.id, file = %file.filename, "{}", e);
                    stats.files_failed += 1;
                    continue;
                }
            };

            let (gist_id, html_url, filename) = (gist.id.clone(), gist.html_url.clone(), file.filename.clone());
            let line_count = lines.len();
            let insertion = self
                .store
                .call(move |s| s.record_finding(&gist_id, &html_url, &filename, &lines))
                .await?;

            let internal_id = insertion.id();
            if insertion.is_new() {
                tracing::info!(gist_id = %gist.id, file = %file.filename, internal_id, "Recorded {} suspicious lines", line_count);
                stats.findings_recorded += 1;
            } else {
                tracing::debug!(gist_id = %gist.id, file = %file.filename, internal_id, "Already recorded");
                stats.duplicates_ignored += 1;
            }
        }
        Ok(())
    }

    async fn inspect_file(&self, file: &GistFile) -> Result<FileOutcome, FileError> {
        // Trust the advertised size when there is one to avoid the download
        if let Some(size) = file.size.filter(|size| *size > self.max_file_bytes) {
            return Ok(FileOutcome::Oversized(size));
        }

        let content = match self.feed.fetch_raw(file).await {
            Err(FeedError::TooLarge { size, .. }) => return Ok(FileOutcome::Oversized(size)),
            fetched => fetched?,
        };
        let size = content.len() as u64;
        if size > self.max_file_bytes {
            return Ok(FileOutcome::Oversized(size));
        }

        let lines = self.inspector.inspect(&content).await?;
        Ok(if lines.is_empty() {
            FileOutcome::Clean
        } else {
            FileOutcome::Flagged(lines)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::testing::{BrittleInspector, FakeFeed, FixedClock, gist, keyword_inspector, open_store, t};

    fn cycle(store: &Store, feed: Arc<FakeFeed>, now: i64) -> ScanCycle {
        let filter = FileFilter::from_config(&crate::config::ScanConfig::default()).unwrap();
        ScanCycle::new(store.clone(), feed, filter, keyword_inspector())
            .with_clock(Arc::new(FixedClock(t(now))))
            .with_max_file_bytes(1024)
    }

    #[tokio::test]
    async fn test_partial_failure_still_advances_checkpoint() {
        let (_dir, store) = open_store();
        let feed = Arc::new(
            FakeFeed::new(vec![gist("g1", &["one.env", "two.env", "three.env"])])
                .with_raw("g1/one.env", "password=1")
                .with_failing_raw("g1/two.env")
                .with_raw("g1/three.env", "ok\nsecret=3"),
        );

        let stats = cycle(&store, feed.clone(), 60).run_once().await.unwrap();

        assert_eq!(stats.files_seen, 3);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.findings_recorded, 2);

        let files: Vec<String> = store.query_range(1, 10).unwrap().into_iter().map(|r| r.file).collect();
        assert_eq!(files, vec!["one.env", "three.env"]);
        assert_eq!(store.query_range(1, 10).unwrap()[1].line_nums, vec![2]);
        assert_eq!(store.get_checkpoint().unwrap(), t(60));
        assert!(stats.checkpoint_advanced);
    }

    #[tokio::test]
    async fn test_inspector_failure_is_confined_to_its_file() {
        let (_dir, store) = open_store();
        let feed = Arc::new(
            FakeFeed::new(vec![gist("g1", &["one.env", "two.env"]), gist("g2", &["three.env"])])
                .with_raw("g1/one.env", "password=1")
                .with_raw("g1/two.env", "secret=2\nCORRUPT")
                .with_raw("g2/three.env", "ok\nsecret=3"),
        );
        let filter = FileFilter::from_config(&crate::config::ScanConfig::default()).unwrap();
        let cycle = ScanCycle::new(store.clone(), feed.clone(), filter, Arc::new(BrittleInspector::new("CORRUPT")))
            .with_clock(Arc::new(FixedClock(t(60))));

        let stats = cycle.run_once().await.unwrap();

        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_inspected, 2);
        assert_eq!(stats.findings_recorded, 2);
        let recorded: Vec<(String, String)> = store
            .query_latest(10)
            .unwrap()
            .into_iter()
            .map(|r| (r.gist_id, r.file))
            .collect();
        assert_eq!(
            recorded,
            vec![
                ("g2".to_string(), "three.env".to_string()),
                ("g1".to_string(), "one.env".to_string()),
            ]
        );
        assert_eq!(store.get_checkpoint().unwrap(), t(60));
        assert!(stats.checkpoint_advanced);
    }

    #[tokio::test]
    async fn test_feed_is_queried_from_the_checkpoint() {
        let (_dir, store) = open_store();
        let feed = Arc::new(FakeFeed::new(vec![]));

        cycle(&store, feed.clone(), 30).run_once().await.unwrap();
        cycle(&store, feed.clone(), 90).run_once().await.unwrap();

        assert_eq!(feed.since_calls(), vec![t(0), t(30)]);
    }

    #[tokio::test]
    async fn test_rescanning_a_window_is_idempotent() {
        let (_dir, store) = open_store();
        let feed = Arc::new(
            FakeFeed::new(vec![gist("g1", &["a.py", "b.py"])])
                .with_raw("g1/a.py", "PASSWORD = 'x'")
                .with_raw("g1/b.py", "secret_key = 1"),
        );

        let first = cycle(&store, feed.clone(), 10).run_once().await.unwrap();
        let second = cycle(&store, feed.clone(), 20).run_once().await.unwrap();

        assert_eq!((first.findings_recorded, first.duplicates_ignored), (2, 0));
        assert_eq!((second.findings_recorded, second.duplicates_ignored), (0, 2));
        assert_eq!(store.stats().unwrap().findings, 2);
        assert_eq!(store.stats().unwrap().gists, 1);
    }

    #[tokio::test]
    async fn test_feed_failure_leaves_checkpoint_alone() {
        let (_dir, store) = open_store();
        let feed = Arc::new(FakeFeed::failing());

        let err = cycle(&store, feed, 60).run_once().await.unwrap_err();

        assert_eq!(err.stage, CycleStage::FetchingFeed);
        assert!(!err.is_contract_violation());
        assert_eq!(store.get_checkpoint().unwrap(), t(0));
    }

    #[tokio::test]
    async fn test_missing_checkpoint_is_a_contract_violation() {
        let (_dir, store) = open_store();
        rusqlite::Connection::open(store.path())
            .unwrap()
            .execute("DELETE FROM config", [])
            .unwrap();

        let err = cycle(&store, Arc::new(FakeFeed::new(vec![])), 60)
            .run_once()
            .await
            .unwrap_err();

        assert_eq!(err.stage, CycleStage::FetchingCheckpoint);
        assert!(err.is_contract_violation());
    }

    #[tokio::test]
    async fn test_filtered_clean_and_oversized_files() {
        let (_dir, store) = open_store();
        let mut big = gist("g1", &["README.md", "clean.txt", "big.txt", "huge.txt"]);
        big.files[3].size = Some(10_000);
        let feed = Arc::new(
            FakeFeed::new(vec![big])
                .with_raw("g1/clean.txt", "nothing to see")
                .with_raw("g1/big.txt", &"password\n".repeat(200)),
        );

        let stats = cycle(&store, feed.clone(), 60).run_once().await.unwrap();

        assert_eq!(stats.files_filtered, 1);
        assert_eq!(stats.files_inspected, 1);
        assert_eq!(stats.files_oversized, 2);
        assert_eq!(stats.findings_recorded, 0);
        assert_eq!(stats.files_clean(), 1);
        // Neither the excluded nor the advertised-oversized file is downloaded
        assert_eq!(feed.raw_calls(), vec!["g1/clean.txt", "g1/big.txt"]);
    }

    #[tokio::test]
    async fn test_checkpoint_never_moves_backward() {
        let (_dir, store) = open_store();
        store.set_checkpoint(t(100)).unwrap();

        let stats = cycle(&store, Arc::new(FakeFeed::new(vec![])), 50).run_once().await.unwrap();

        assert_eq!(store.get_checkpoint().unwrap(), t(100));
        assert!(!stats.checkpoint_advanced);
    }

    #[tokio::test]
    async fn test_malformed_items_are_counted() {
        let (_dir, store) = open_store();
        let feed = Arc::new(FakeFeed::new(vec![gist("g1", &["a.txt"])]).with_malformed(2));

        let stats = cycle(&store, feed, 60).run_once().await.unwrap();

        assert_eq!(stats.items_fetched, 1);
        assert_eq!(stats.malformed_items, 2);
        // a.txt has no raw content registered, so it fails on its own
        assert_eq!(stats.files_failed, 1);
    }
}
