//! Configuration management for gistwatch
//!
//! Configuration is layered with figment: embedded defaults, then an optional
//! config file (TOML, JSON or YAML), then `GISTWATCH_` environment variables.
//! CLI flags are applied on top by the command layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod loader;
pub mod smart_load;

#[cfg(test)]
mod tests;

pub use loader::{CliOverrides, find_config_file};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GistwatchConfig {
    /// Upstream feed access
    pub feed: FeedConfig,

    /// Scan cycle behaviour and content filtering
    pub scan: ScanConfig,

    /// Secret detector selection
    pub inspector: InspectorConfig,

    /// Database location
    pub storage: StorageConfig,

    /// Read view HTTP server
    pub server: ServerConfig,
}

/// Upstream feed configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Base URL of the provider API
    pub api_url: String,

    /// Account name used for basic auth
    pub username: Option<String>,

    /// Access token used for basic auth
    pub token: Option<String>,

    /// Page size requested from the provider (the provider caps it at 100)
    pub per_page: u32,

    /// Timeout applied to every HTTP call (seconds)
    pub timeout_secs: u64,

    pub user_agent: String,
}

/// Scan cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Delay between cycle starts (seconds)
    pub interval_secs: u64,

    /// Checkpoint written on first run; defaults to the time of installation
    pub initial_checkpoint: Option<DateTime<Utc>>,

    /// File extensions never inspected (without the leading dot)
    pub excluded_extensions: Vec<String>,

    /// Glob patterns for pseudo-files that are not real content
    pub excluded_files: Vec<String>,

    /// Raw content above this size is skipped
    pub max_file_bytes: u64,
}

/// Which secret detector to run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InspectorKind {
    /// In-process keyword / regex matching
    #[default]
    Keywords,
    /// External detector process
    External,
}

/// Secret inspector configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InspectorConfig {
    pub kind: InspectorKind,

    /// Case-insensitive keywords that flag a line
    pub keywords: Vec<String>,

    /// Additional regular expressions that flag a line
    pub patterns: Vec<String>,

    /// External detector executable
    pub command: Option<String>,

    /// Arguments passed before the content path
    pub args: Vec<String>,

    /// Time allowed for a single external detector run (seconds)
    pub timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,

    /// How long a connection waits on a locked database (milliseconds)
    pub busy_timeout_ms: u64,
}

/// Read view server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Rows per page and the widest accepted id window
    pub page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            username: None,
            token: None,
            per_page: 100,
            timeout_secs: 30,
            user_agent: "gistwatch".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            initial_checkpoint: None,
            excluded_extensions: vec![
                "md".to_string(),
                "rst".to_string(),
                "ipynb".to_string(),
                "markdown".to_string(),
                "log".to_string(),
            ],
            excluded_files: vec![],
            max_file_bytes: 1024 * 1024,
        }
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            kind: InspectorKind::Keywords,
            keywords: vec!["secret".to_string(), "password".to_string()],
            patterns: vec![],
            command: None,
            args: vec![],
            timeout_secs: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gistwatch.db"),
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            page_size: 10,
        }
    }
}

impl GistwatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scan.interval_secs == 0 {
            anyhow::bail!("scan.interval_secs must be greater than zero");
        }

        if self.server.page_size == 0 {
            anyhow::bail!("server.page_size must be greater than zero");
        }

        if self.feed.timeout_secs == 0 {
            anyhow::bail!("feed.timeout_secs must be greater than zero");
        }

        if self.feed.username.is_some() && self.feed.token.is_none() {
            anyhow::bail!("feed.username is set but feed.token is missing");
        }

        if self.inspector.kind == InspectorKind::External {
            match self.inspector.command.as_deref() {
                Some(command) if !command.trim().is_empty() => {}
                _ => anyhow::bail!("inspector.command is required when inspector.kind = \"external\""),
            }
        }

        for pattern in &self.inspector.patterns {
            regex::Regex::new(pattern)
                .map_err(|e| anyhow::anyhow!("Invalid inspector pattern '{}': {}", pattern, e))?;
        }

        for pattern in &self.scan.excluded_files {
            globset::Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("Invalid excluded_files pattern '{}': {}", pattern, e))?;
        }

        Ok(())
    }

    /// Copy of the configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.feed.token.is_some() {
            config.feed.token = Some("********".to_string());
        }
        config
    }

    /// Page size requested from the provider, clamped to what it accepts
    pub fn effective_per_page(&self) -> u32 {
        self.feed.per_page.clamp(1, 100)
    }
}
