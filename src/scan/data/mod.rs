//! Data produced by a scan cycle

mod stats;

pub use stats::CycleStats;
