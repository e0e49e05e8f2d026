//! Extension-based file filtering

use super::{Filter, FilterDecision};
use std::collections::HashSet;

/// Skip files whose extension is in the configured exclusion set
///
/// Matching is case-insensitive and looks only at the last extension, so
/// `notes.backup.md` is excluded while `Dockerfile` (no extension) is not.
pub struct ExtensionFilter {
    excluded: HashSet<String>,
}

impl ExtensionFilter {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let excluded = extensions
            .iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { excluded }
    }

    fn extension_of(filename: &str) -> Option<String> {
        let (stem, ext) = filename.rsplit_once('.')?;
        // ".env" is a dotfile name, not an empty stem with extension "env"
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

impl Filter for ExtensionFilter {
    type Input = str;
    type Output = FilterDecision;

    fn filter(&self, filename: &str) -> FilterDecision {
        match Self::extension_of(filename) {
            Some(ext) if self.excluded.contains(&ext) => FilterDecision::Skip("excluded extension"),
            _ => FilterDecision::Process,
        }
    }

    fn name(&self) -> &'static str {
        "ExtensionFilter"
    }
}
