//! Per-cycle statistics

use serde::Serialize;
use std::fmt;

/// Counters collected while one cycle walks the fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    // Feed
    pub items_fetched: usize,
    pub malformed_items: usize,

    // Files
    pub files_seen: usize,
    pub files_filtered: usize,
    pub files_oversized: usize,
    pub files_inspected: usize,
    pub files_failed: usize,

    // Findings
    pub findings_recorded: usize,
    pub duplicates_ignored: usize,

    /// False when the clock had not moved past the stored checkpoint
    pub checkpoint_advanced: bool,
    pub duration_ms: u64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files that were inspected without turning up anything
    pub fn files_clean(&self) -> usize {
        self.files_inspected
            .saturating_sub(self.findings_recorded + self.duplicates_ignored)
    }

    /// Whether every attempted file went through
    pub fn is_complete(&self) -> bool {
        self.files_failed == 0
    }

    /// Percentage of seen files that never needed a raw fetch
    pub fn filter_efficiency(&self) -> f64 {
        if self.files_seen == 0 {
            return 0.0;
        }
        (self.files_filtered as f64 / self.files_seen as f64) * 100.0
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} gists ({} malformed), {} files: {} filtered, {} oversized, {} inspected, {} failed; \
             {} new findings, {} duplicates in {}ms",
            self.items_fetched,
            self.malformed_items,
            self.files_seen,
            self.files_filtered,
            self.files_oversized,
            self.files_inspected,
            self.files_failed,
            self.findings_recorded,
            self.duplicates_ignored,
            self.duration_ms
        )
    }
}
