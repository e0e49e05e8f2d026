//! Incremental scanning of the gist feed
//!
//! - [`filters`] decides which files are worth a download
//! - [`inspector`] finds suspicious lines in raw content
//! - [`cycle`] runs one fetch / inspect / record / checkpoint pass
//! - [`scheduler`] repeats the cycle on a fixed interval

pub mod cycle;
pub mod data;
pub mod filters;
pub mod inspector;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use cycle::{Clock, CycleError, CycleStage, FileError, ScanCycle, SystemClock};
pub use data::CycleStats;
pub use filters::FileFilter;
pub use inspector::SecretInspector;
pub use scheduler::Watcher;
