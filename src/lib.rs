//! # gistwatch - incremental secret-leak watcher for public gists
//!
//! gistwatch repeatedly asks the public gist feed for everything updated
//! since its last checkpoint, inspects each new file for lines that look
//! like leaked credentials and records every finding exactly once in SQLite.
//! A small read view pages through the findings by id.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scan continuously and serve the read view on 127.0.0.1:3000
//! GITHUB_TOKEN=... gistwatch watch --serve
//!
//! # One cycle, then print the newest findings
//! gistwatch scan
//! gistwatch findings
//! ```
//!
//! ## Layout
//!
//! - [`feed`] - typed client for the upstream gist API
//! - [`scan`] - filters, inspectors, the scan cycle and its scheduler
//! - [`store`] - checkpoint and finding persistence
//! - [`query`] / [`server`] - the read side

pub mod cli;
pub mod config;
pub mod context;
pub mod feed;
pub mod query;
pub mod scan;
pub mod server;
pub mod store;

pub use config::GistwatchConfig;
pub use context::AppContext;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
