//! External detector adapter
//!
//! The content is written to a scratch file whose path is appended to the
//! configured command line. The detector must print a JSON report on stdout
//! in the detect-secrets layout, either bare or wrapped in a baseline:
//!
//! ```json
//! {"/tmp/gistwatch-x.txt": [{"type": "Secret Keyword", "line_number": 3}]}
//! {"version": "1.4.0", "results": {"/tmp/gistwatch-x.txt": [{"line_number": 3}]}}
//! ```

use super::{InspectError, LineNumbers, SecretInspector, normalize};
use crate::config::InspectorConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

const STDERR_LIMIT: usize = 500;

pub struct ExternalInspector {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectorReport {
    Baseline { results: BTreeMap<String, Vec<DetectorHit>> },
    Files(BTreeMap<String, Vec<DetectorHit>>),
}

#[derive(Debug, Deserialize)]
struct DetectorHit {
    line_number: usize,
}

impl ExternalInspector {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &InspectorConfig) -> Result<Self, InspectError> {
        let command = config
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| InspectError::Config("no detector command configured".to_string()))?;

        Ok(Self::new(
            command,
            config.args.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        ))
    }

    fn parse_report(stdout: &[u8]) -> Result<LineNumbers, InspectError> {
        let report: DetectorReport = serde_json::from_slice(stdout).map_err(|e| {
            InspectError::Malformed(format!(
                "{} (output: {})",
                e,
                String::from_utf8_lossy(&stdout[..stdout.len().min(120)])
            ))
        })?;

        let files = match report {
            DetectorReport::Baseline { results } => results,
            DetectorReport::Files(files) => files,
        };

        let lines = files
            .into_values()
            .flatten()
            .map(|hit| hit.line_number)
            .collect();
        Ok(normalize(lines))
    }
}

#[async_trait]
impl SecretInspector for ExternalInspector {
    async fn inspect(&self, content: &str) -> Result<LineNumbers, InspectError> {
        let mut scratch = tempfile::Builder::new()
            .prefix("gistwatch-")
            .suffix(".txt")
            .tempfile()?;
        scratch.write_all(content.as_bytes())?;
        scratch.flush()?;

        let mut command = tokio::process::Command::new(&self.command);
        command
            .args(&self.args)
            .arg(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(InspectError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(source)) => {
                return Err(InspectError::Spawn {
                    command: self.command.clone(),
                    source,
                });
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InspectError::Failed {
                status: output.status.to_string(),
                stderr: stderr.chars().take(STDERR_LIMIT).collect(),
            });
        }

        Self::parse_report(&output.stdout)
    }

    fn name(&self) -> &'static str {
        "external"
    }
}
