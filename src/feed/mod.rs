//! Upstream gist feed
//!
//! The scan cycle only sees the [`GistFeed`] trait: one call to list gists
//! updated since a checkpoint and one call to fetch a file's raw content.
//! [`GithubFeed`] is the HTTP implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod client;
pub mod types;

pub use client::GithubFeed;
pub use types::{FeedPage, Gist, GistFile, RateLimit};

/// Errors talking to the upstream provider
#[derive(Debug, Error)]
pub enum FeedError {
    /// The call exceeded its timeout
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection or protocol failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with something other than 200
    #[error("{url} responded with HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Raw content exceeded the download cap; `size` is a lower bound when streamed
    #[error("{url} is larger than {limit} bytes ({size} seen)")]
    TooLarge { url: String, size: u64, limit: u64 },

    /// The body could not be decoded
    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The client could not be built from configuration
    #[error("invalid feed configuration: {0}")]
    Config(String),
}

/// Source of gists and their raw file content
#[async_trait]
pub trait GistFeed: Send + Sync {
    /// Fetch the single most-recent-first page of gists updated since `since`
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<FeedPage, FeedError>;

    /// Fetch the raw text of one file
    async fn fetch_raw(&self, file: &GistFile) -> Result<String, FeedError>;
}
