//! Filters deciding which gist files reach the secret inspector
//!
//! Filters run on the filename alone, before any raw content is fetched, so
//! every rejected file saves one HTTP round trip. They are applied in order:
//!
//! 1. **Extension Filter** - documentation, notebook and log-like extensions
//! 2. **Synthetic File Filter** - pseudo-files injected by upstream integrations

pub mod extension;
pub mod synthetic;

pub use extension::ExtensionFilter;
pub use synthetic::SyntheticFileFilter;

use crate::config::ScanConfig;
use anyhow::Result;

/// Common trait for all filters
pub trait Filter {
    /// Input type for the filter
    type Input: ?Sized;
    /// Output type for the filter
    type Output;

    /// Apply the filter to the input
    fn filter(&self, input: &Self::Input) -> Self::Output;

    /// Get the name of this filter for debugging/logging
    fn name(&self) -> &'static str;
}

/// Decision enum for filename-level filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Inspect this file
    Process,
    /// Skip this file with reason
    Skip(&'static str),
}

/// The full filename filter chain
pub struct FileFilter {
    extension: ExtensionFilter,
    synthetic: SyntheticFileFilter,
}

impl FileFilter {
    /// Build the chain from scan configuration
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            extension: ExtensionFilter::new(&config.excluded_extensions),
            synthetic: SyntheticFileFilter::new(&config.excluded_files)?,
        })
    }

    /// Run every filter in order and return the first skip, if any
    pub fn decide(&self, filename: &str) -> FilterDecision {
        let decision = self.extension.filter(filename);
        if decision != FilterDecision::Process {
            tracing::trace!("{} skipped {}", self.extension.name(), filename);
            return decision;
        }

        let decision = self.synthetic.filter(filename);
        if decision != FilterDecision::Process {
            tracing::trace!("{} skipped {}", self.synthetic.name(), filename);
        }
        decision
    }

    /// Whether a file with this name should be fetched and inspected
    pub fn should_inspect(&self, filename: &str) -> bool {
        self.decide(filename) == FilterDecision::Process
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_table() {
        let filter = FileFilter::from_config(&ScanConfig::default()).unwrap();

        let cases = [
            ("x.md", false),
            ("x.rst", false),
            ("x.ipynb", false),
            ("x.markdown", false),
            ("x.log", false),
            ("x.py", true),
            ("x.txt", true),
            ("Dockerfile", true),
            (".env", true),
            ("notes.MD", false),
        ];

        for (filename, expected) in cases {
            assert_eq!(filter.should_inspect(filename), expected, "filename: {filename}");
        }
    }

    #[test]
    fn test_synthetic_entries_are_rejected_after_extensions() {
        let config = ScanConfig {
            excluded_files: vec!["ci-metadata.json".to_string()],
            ..ScanConfig::default()
        };
        let filter = FileFilter::from_config(&config).unwrap();

        assert_eq!(filter.decide("README.md"), FilterDecision::Skip("excluded extension"));
        assert_eq!(filter.decide("ci-metadata.json"), FilterDecision::Skip("synthetic file"));
        assert_eq!(filter.decide("config.json"), FilterDecision::Process);
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let config = ScanConfig {
            excluded_files: vec!["[unclosed".to_string()],
            ..ScanConfig::default()
        };
        assert!(FileFilter::from_config(&config).is_err());
    }
}
