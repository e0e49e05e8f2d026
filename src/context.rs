//! Wiring of configured components
//!
//! Commands build one [`AppContext`] from the loaded configuration and ask
//! it for the pieces they need. Every component receives its handles at
//! construction; nothing is looked up globally.

use crate::config::GistwatchConfig;
use crate::feed::GithubFeed;
use crate::query::QueryService;
use crate::scan::{FileFilter, ScanCycle, Watcher, inspector};
use crate::server::ReadServer;
use crate::store::Store;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

pub struct AppContext {
    pub config: GistwatchConfig,
    pub store: Store,
}

impl AppContext {
    /// Open the store named by the configuration, seeding the checkpoint on first use
    pub fn open(config: GistwatchConfig) -> Result<Self> {
        let initial = config.scan.initial_checkpoint.unwrap_or_else(Utc::now);
        let store = Store::open(
            &config.storage.path,
            Duration::from_millis(config.storage.busy_timeout_ms),
            initial,
        )
        .with_context(|| format!("Failed to open database {}", config.storage.path.display()))?;

        Ok(Self { config, store })
    }

    pub fn scan_cycle(&self) -> Result<ScanCycle> {
        let mut feed_config = self.config.feed.clone();
        feed_config.per_page = self.config.effective_per_page();
        let feed = GithubFeed::new(&feed_config)
            .context("Failed to build feed client")?
            .with_max_raw_bytes(self.config.scan.max_file_bytes);

        let filter = FileFilter::from_config(&self.config.scan)?;
        let inspector = inspector::from_config(&self.config.inspector).context("Failed to build secret inspector")?;

        Ok(ScanCycle::new(self.store.clone(), Arc::new(feed), filter, inspector)
            .with_max_file_bytes(self.config.scan.max_file_bytes))
    }

    pub fn watcher(&self) -> Result<Watcher> {
        Ok(Watcher::new(
            self.scan_cycle()?,
            Duration::from_secs(self.config.scan.interval_secs),
        ))
    }

    pub fn query_service(&self) -> QueryService {
        QueryService::new(self.store.clone(), self.config.server.page_size)
    }

    pub fn read_server(&self) -> ReadServer {
        ReadServer::new(self.query_service())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}
