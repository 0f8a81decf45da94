//! Offset pagination and creation-time windows for list endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A clamped `take`/`skip` window.
///
/// Out-of-range input is corrected rather than rejected: `take < 1` falls
/// back to [`Pagination::DEFAULT_TAKE`], `take > 100` is capped at
/// [`Pagination::MAX_TAKE`], and a negative `skip` becomes zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    take: i64,
    skip: i64,
}

impl Pagination {
    pub const DEFAULT_TAKE: i64 = 10;
    pub const MAX_TAKE: i64 = 100;

    /// Build a window from raw query values.
    #[must_use]
    pub fn new(take: Option<i64>, skip: Option<i64>) -> Self {
        let take = match take {
            Some(t) if t > Self::MAX_TAKE => Self::MAX_TAKE,
            Some(t) if t >= 1 => t,
            _ => Self::DEFAULT_TAKE,
        };
        let skip = skip.unwrap_or(0).max(0);
        Self { take, skip }
    }

    /// Page size, the SQL `LIMIT`.
    #[must_use]
    pub const fn take(&self) -> i64 {
        self.take
    }

    /// Rows skipped, the SQL `OFFSET`.
    #[must_use]
    pub const fn skip(&self) -> i64 {
        self.skip
    }

    /// Slice an already filtered and ordered collection.
    #[must_use]
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(self.take).unwrap_or(0);
        items.iter().skip(skip).take(take).cloned().collect()
    }

    /// Pair this window with the unpaginated total.
    #[must_use]
    pub const fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            take: self.take,
            skip: self.skip,
            total,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Inclusive bounds on `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub beginning: Option<DateTime<Utc>>,
    pub ending: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.beginning.is_none_or(|b| at >= b) && self.ending.is_none_or(|e| at <= e)
    }
}

/// The `pagination` object returned next to every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub take: i64,
    pub skip: i64,
    /// Rows matching the filter before `take`/`skip` were applied.
    pub total: i64,
}

/// One page of results plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(data: Vec<T>, pagination: PageMeta) -> Self {
        Self { data, pagination }
    }
}
