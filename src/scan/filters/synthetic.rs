//! Pseudo-file filtering
//!
//! Some upstream integrations inject entries into a gist that are metadata
//! rather than user content. They are matched by filename against configured
//! glob patterns; an exact name is simply a glob without wildcards.

use super::{Filter, FilterDecision};
use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};

pub struct SyntheticFileFilter {
    patterns: GlobSet,
}

impl SyntheticFileFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("Invalid glob pattern '{}': {}", pattern, e))?;
            builder.add(glob);
        }

        let patterns = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build GlobSet: {}", e))?;

        tracing::debug!("Compiled {} synthetic file patterns", patterns.len());
        Ok(Self { patterns })
    }
}

impl Filter for SyntheticFileFilter {
    type Input = str;
    type Output = FilterDecision;

    fn filter(&self, filename: &str) -> FilterDecision {
        if self.patterns.is_match(filename) {
            FilterDecision::Skip("synthetic file")
        } else {
            FilterDecision::Process
        }
    }

    fn name(&self) -> &'static str {
        "SyntheticFileFilter"
    }
}
