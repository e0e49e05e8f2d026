//! Typed view of the public gist feed
//!
//! The upstream API returns loosely structured JSON. Everything is decoded
//! into `Raw*` shapes with optional fields first and then validated into
//! [`Gist`] / [`GistFile`]; items missing required fields are dropped at this
//! boundary instead of leaking `None` checks into the scan cycle.

use serde::Deserialize;
use std::collections::BTreeMap;

/// One upstream item that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gist {
    /// Provider-assigned opaque id
    pub id: String,
    /// Link shown in the read view
    pub html_url: String,
    /// Files in the gist, ordered by their key in the feed
    pub files: Vec<GistFile>,
}

/// One file entry within a gist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistFile {
    /// Key of the entry in the gist's file map
    pub name: String,
    /// Canonical filename reported by the provider (falls back to `name`)
    pub filename: String,
    /// Location of the raw content
    pub raw_url: String,
    /// Size in bytes when the provider reports it
    pub size: Option<u64>,
}

/// Rate-limit metadata lifted from response headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: Option<u32>,
    pub limit: Option<u32>,
    /// Unix timestamp at which the window resets
    pub reset: Option<i64>,
}

/// Result of a single feed request
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub gists: Vec<Gist>,
    /// Items dropped because required fields were missing or mistyped
    pub malformed: usize,
    /// Individual file entries dropped for the same reason
    pub malformed_files: usize,
    pub rate_limit: RateLimit,
}

#[derive(Debug, Deserialize)]
struct RawGist {
    id: Option<String>,
    html_url: Option<String>,
    #[serde(default)]
    files: BTreeMap<String, Option<RawFile>>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    filename: Option<String>,
    raw_url: Option<String>,
    size: Option<u64>,
}

impl FeedPage {
    /// Validate a decoded JSON array of feed items.
    ///
    /// Each element is decoded independently so one broken item does not
    /// discard the rest of the page.
    pub fn from_items(items: Vec<serde_json::Value>, rate_limit: RateLimit) -> Self {
        let mut page = FeedPage {
            rate_limit,
            ..Default::default()
        };

        for item in items {
            let raw: RawGist = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!("Skipping undecodable feed item: {}", e);
                    page.malformed += 1;
                    continue;
                }
            };

            let (Some(id), Some(html_url)) = (non_empty(raw.id), non_empty(raw.html_url)) else {
                tracing::debug!("Skipping feed item without id or html_url");
                page.malformed += 1;
                continue;
            };

            let mut files = Vec::with_capacity(raw.files.len());
            for (name, entry) in raw.files {
                match entry.and_then(|f| GistFile::from_raw(&name, f)) {
                    Some(file) => files.push(file),
                    None => {
                        tracing::debug!(gist_id = %id, file = %name, "Skipping file entry without raw_url");
                        page.malformed_files += 1;
                    }
                }
            }

            page.gists.push(Gist { id, html_url, files });
        }

        page
    }

    /// Total number of file entries across all gists on the page
    pub fn file_count(&self) -> usize {
        self.gists.iter().map(|g| g.files.len()).sum()
    }
}

impl GistFile {
    fn from_raw(name: &str, raw: RawFile) -> Option<Self> {
        let raw_url = non_empty(raw.raw_url)?;
        let filename = non_empty(raw.filename).unwrap_or_else(|| name.to_string());
        Some(Self {
            name: name.to_string(),
            filename,
            raw_url,
            size: raw.size,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_items_are_kept() {
        let items = vec![json!({
            "id": "abc",
            "html_url": "https://gist.github.com/abc",
            "files": {
                "b.py": {"filename": "b.py", "raw_url": "https://raw/b", "size": 12},
                "a.txt": {"filename": "a.txt", "raw_url": "https://raw/a"}
            }
        })];

        let page = FeedPage::from_items(items, RateLimit::default());
        assert_eq!(page.malformed, 0);
        assert_eq!(page.gists.len(), 1);

        let gist = &page.gists[0];
        assert_eq!(gist.id, "abc");
        assert_eq!(gist.files.len(), 2);
        assert_eq!(gist.files[0].name, "a.txt");
        assert_eq!(gist.files[0].size, None);
        assert_eq!(gist.files[1].size, Some(12));
        assert_eq!(page.file_count(), 2);
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let items = vec![
            json!({"html_url": "https://gist.github.com/x", "files": {}}),
            json!({"id": "", "html_url": "https://gist.github.com/y"}),
            json!({"id": 42, "html_url": "https://gist.github.com/z"}),
            json!("not an object"),
            json!({"id": "ok", "html_url": "https://gist.github.com/ok"}),
        ];

        let page = FeedPage::from_items(items, RateLimit::default());
        assert_eq!(page.malformed, 4);
        assert_eq!(page.gists.len(), 1);
        assert_eq!(page.gists[0].id, "ok");
        assert!(page.gists[0].files.is_empty());
    }

    #[test]
    fn test_file_entries_without_raw_url_are_dropped() {
        let items = vec![json!({
            "id": "abc",
            "html_url": "https://gist.github.com/abc",
            "files": {
                "keep.sh": {"raw_url": "https://raw/keep"},
                "drop.sh": {"filename": "drop.sh"},
                "null.sh": null
            }
        })];

        let page = FeedPage::from_items(items, RateLimit::default());
        assert_eq!(page.malformed_files, 2);
        let files = &page.gists[0].files;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "keep.sh");
        // Canonical filename falls back to the map key
        assert_eq!(files[0].filename, "keep.sh");
    }
}
