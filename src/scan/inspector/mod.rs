//! Secret inspectors
//!
//! An inspector turns raw file content into the 1-based line numbers that
//! look like they hold a secret. Two interchangeable implementations sit
//! behind [`SecretInspector`]:
//!
//! - [`KeywordInspector`] - in-process, case-insensitive keyword / regex match
//! - [`ExternalInspector`] - runs an external detector and reads its JSON report

use crate::config::{InspectorConfig, InspectorKind};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub mod external;
pub mod keywords;

pub use external::ExternalInspector;
pub use keywords::KeywordInspector;

/// Ordered, de-duplicated 1-based line numbers
pub type LineNumbers = Vec<usize>;

/// Failures of a single inspection; always scoped to one file
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("invalid detector pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("detector misconfigured: {0}")]
    Config(String),

    #[error("failed to run detector '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("detector timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("detector exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("malformed detector output: {0}")]
    Malformed(String),

    #[error("detector scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content inspection contract
#[async_trait]
pub trait SecretInspector: Send + Sync {
    /// Return the ordered line numbers that look like they contain a secret.
    /// An empty result means "nothing found", not an error.
    async fn inspect(&self, content: &str) -> Result<LineNumbers, InspectError>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Build the inspector selected by configuration
pub fn from_config(config: &InspectorConfig) -> Result<Arc<dyn SecretInspector>, InspectError> {
    let inspector: Arc<dyn SecretInspector> = match config.kind {
        InspectorKind::Keywords => Arc::new(KeywordInspector::new(&config.keywords, &config.patterns)?),
        InspectorKind::External => Arc::new(ExternalInspector::from_config(config)?),
    };
    tracing::debug!("Using {} secret inspector", inspector.name());
    Ok(inspector)
}

/// Sort and de-duplicate line numbers, dropping the invalid line 0
pub(crate) fn normalize(mut lines: LineNumbers) -> LineNumbers {
    lines.retain(|&line| line > 0);
    lines.sort_unstable();
    lines.dedup();
    lines
}
