//! Row types returned by the store

use super::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A finding joined with its gist's display URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingRow {
    pub internal_id: i64,
    pub gist_id: String,
    pub html_url: String,
    pub file: String,
    pub line_nums: Vec<usize>,
}

/// Outcome of recording a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// A new row was written with this id
    Inserted(i64),
    /// The (gist, file) pair was already recorded under this id
    Duplicate(i64),
}

impl Insertion {
    pub fn id(&self) -> i64 {
        match self {
            Insertion::Inserted(id) | Insertion::Duplicate(id) => *id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Insertion::Inserted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub gists: u64,
    pub findings: u64,
    pub max_internal_id: Option<i64>,
    pub checkpoint: Option<DateTime<Utc>>,
}

/// Line numbers are stored as a comma separated list, e.g. `2,7,31`
pub(crate) fn encode_line_nums(lines: &[usize]) -> String {
    lines
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn decode_line_nums(internal_id: i64, value: &str) -> Result<Vec<usize>, StoreError> {
    let corrupt = || StoreError::CorruptLineNums {
        internal_id,
        value: value.to_string(),
    };

    let lines = value
        .split(',')
        .map(|part| part.trim().parse::<usize>().map_err(|_| corrupt()))
        .collect::<Result<Vec<_>, _>>()?;

    if lines.is_empty() || lines.contains(&0) {
        return Err(corrupt());
    }
    Ok(lines)
}
