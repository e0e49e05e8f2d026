//! In-process keyword inspector

use super::{InspectError, LineNumbers, SecretInspector};
use async_trait::async_trait;
use regex::{RegexSet, RegexSetBuilder};

/// Flags every line that matches one of the configured keywords or patterns.
///
/// Keywords are matched literally, patterns as regular expressions; both
/// ignore case. Lines are split on `\n` so numbering matches what a viewer
/// shows for the raw file.
pub struct KeywordInspector {
    set: RegexSet,
}

impl KeywordInspector {
    pub fn new<K: AsRef<str>, P: AsRef<str>>(keywords: &[K], patterns: &[P]) -> Result<Self, InspectError> {
        let mut sources: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        sources.extend(patterns.iter().map(|p| p.as_ref().to_string()));

        let set = RegexSetBuilder::new(&sources)
            .case_insensitive(true)
            .build()
            .map_err(|e| InspectError::Pattern {
                pattern: sources.join(" | "),
                reason: e.to_string(),
            })?;

        Ok(Self { set })
    }

    /// Synchronous core of [`SecretInspector::inspect`]
    pub fn matching_lines(&self, content: &str) -> LineNumbers {
        if self.set.is_empty() {
            return Vec::new();
        }

        content
            .split('\n')
            .enumerate()
            .filter(|(_, line)| self.set.is_match(line))
            // Line numbers in gist views begin at 1
            .map(|(index, _)| index + 1)
            .collect()
    }
}

#[async_trait]
impl SecretInspector for KeywordInspector {
    async fn inspect(&self, content: &str) -> Result<LineNumbers, InspectError> {
        Ok(self.matching_lines(content))
    }

    fn name(&self) -> &'static str {
        "keywords"
    }
}
