//! Read side of the finding store
//!
//! Pages are requested with optional `start` / `end` id bounds. Anything
//! that is missing, non-numeric or spans more than one page falls back to
//! the most recent page instead of failing, so a hand-edited URL always
//! renders something. "View more" continues below the smallest visible id.

use crate::store::{FindingRow, Store, StoreError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw `start` / `end` query parameters, kept as text until validated
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Which rows a page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum View {
    Latest,
    Range { start: i64, end: i64 },
}

/// Bounds for the "view more" link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextPage {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub view: View,
    pub rows: Vec<FindingRow>,
    pub next: Option<NextPage>,
}

/// Decide which view a request maps to.
///
/// A range is honoured only when both bounds parse as integers,
/// `end - start <= page_size` and the window is at most `page_size` wide.
/// The "view more" link passes the higher id as `start`, so the usual
/// request looks like `start=40&end=30`.
pub fn resolve_view(params: &PageParams, page_size: u32) -> View {
    let (Some(start), Some(end)) = (params.start.as_deref(), params.end.as_deref()) else {
        return View::Latest;
    };
    let (Ok(start), Ok(end)) = (start.trim().parse::<i64>(), end.trim().parse::<i64>()) else {
        tracing::debug!("Non-numeric page bounds {:?}/{:?}, showing latest", start, end);
        return View::Latest;
    };

    let page_size = i64::from(page_size);
    let too_far_forward = end.saturating_sub(start) > page_size;
    let too_wide = start.saturating_sub(end) > page_size;
    if too_far_forward || too_wide {
        tracing::debug!("Page bounds {}..{} out of range, showing latest", start, end);
        return View::Latest;
    }

    View::Range { start, end }
}

/// "View more" bounds below the smallest id on the page; `None` once id 1 is visible
pub fn next_page(rows: &[FindingRow], page_size: u32) -> Option<NextPage> {
    let min = rows.iter().map(|row| row.internal_id).min()?;
    if min <= 1 {
        return None;
    }
    Some(NextPage {
        start: min - 1,
        end: min - 1 - i64::from(page_size),
    })
}

/// Read-only queries over the store; safe to run alongside the scan loop
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Store,
    page_size: u32,
}

impl QueryService {
    pub fn new(store: Store, page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The newest page of findings, highest id first
    pub async fn latest(&self) -> Result<Vec<FindingRow>, StoreError> {
        let n = self.page_size;
        self.store.call(move |s| s.query_latest(n)).await
    }

    /// Findings with `end <= internal_id <= start`, lowest id first; empty when `start < end`
    pub async fn range(&self, start: i64, end: i64) -> Result<Vec<FindingRow>, StoreError> {
        self.store.call(move |s| s.query_range(end, start)).await
    }

    pub async fn page(&self, params: &PageParams) -> Result<Page, StoreError> {
        let view = resolve_view(params, self.page_size);
        let rows = match view {
            View::Latest => self.latest().await?,
            View::Range { start, end } => self.range(start, end).await?,
        };
        let next = next_page(&rows, self.page_size);
        Ok(Page { view, rows, next })
    }
}
