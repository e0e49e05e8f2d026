//! HTTP client for the public gists endpoint

use super::{FeedError, FeedPage, GistFeed, GistFile, RateLimit};
use crate::config::FeedConfig;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Longest slice of an error body kept in [`FeedError::Status`]
const ERROR_BODY_LIMIT: usize = 200;

/// [`GistFeed`] backed by the GitHub REST API
pub struct GithubFeed {
    http: reqwest::Client,
    public_url: String,
    username: Option<String>,
    token: Option<String>,
    per_page: u32,
    max_raw_bytes: u64,
}

impl GithubFeed {
    /// Create a client from feed configuration
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?;

        Ok(Self {
            http,
            public_url: format!("{}/gists/public", config.api_url.trim_end_matches('/')),
            username: config.username.clone(),
            token: config.token.clone(),
            per_page: config.per_page.clamp(1, 100),
            max_raw_bytes: u64::MAX,
        })
    }

    /// Stop downloading raw content once it grows past `limit` bytes
    pub fn with_max_raw_bytes(mut self, limit: u64) -> Self {
        self.max_raw_bytes = limit;
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.username, &self.token) {
            (Some(user), Some(token)) => request.basic_auth(user, Some(token)),
            (None, Some(token)) => request.bearer_auth(token),
            _ => request,
        }
    }
}

#[async_trait]
impl GistFeed for GithubFeed {
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<FeedPage, FeedError> {
        let url = self.public_url.as_str();
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let per_page = self.per_page.to_string();

        // Only the first page is read; anything beyond it waits for the next window
        let request = self
            .http
            .get(url)
            .query(&[("since", since.as_str()), ("per_page", per_page.as_str()), ("page", "1")]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let rate_limit = rate_limit_from(response.headers());
        let response = ensure_ok(url, response).await?;

        let items: Vec<serde_json::Value> =
            response.json().await.map_err(|e| match classify(url, e) {
                FeedError::Transport { url, source } if source.is_decode() => FeedError::Decode {
                    url,
                    reason: source.to_string(),
                },
                other => other,
            })?;

        Ok(FeedPage::from_items(items, rate_limit))
    }

    async fn fetch_raw(&self, file: &GistFile) -> Result<String, FeedError> {
        let url = file.raw_url.as_str();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let mut response = ensure_ok(url, response).await?;
        let limit = self.max_raw_bytes;
        let too_large = |size: u64| FeedError::TooLarge {
            url: url.to_string(),
            size,
            limit,
        };

        if let Some(size) = response.content_length().filter(|size| *size > limit) {
            return Err(too_large(size));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| classify(url, e))? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > limit {
                return Err(too_large(body.len() as u64));
            }
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

async fn ensure_ok(url: &str, response: reqwest::Response) -> Result<reqwest::Response, FeedError> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(FeedError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body: truncate(&body, ERROR_BODY_LIMIT),
    })
}

fn classify(url: &str, error: reqwest::Error) -> FeedError {
    if error.is_timeout() {
        FeedError::Timeout { url: url.to_string() }
    } else {
        FeedError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

fn rate_limit_from(headers: &HeaderMap) -> RateLimit {
    fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
        headers.get(name)?.to_str().ok()?.trim().parse().ok()
    }

    RateLimit {
        remaining: parse(headers, "x-ratelimit-remaining"),
        limit: parse(headers, "x-ratelimit-limit"),
        reset: parse(headers, "x-ratelimit-reset"),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
