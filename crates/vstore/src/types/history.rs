//! Instance history query parameters.

use chrono::{DateTime, Utc};

use super::VersionRecord;

/// Parameters restricting an instance history listing.
///
/// History is always returned newest first; `since` and `count` trim it.
#[derive(Debug, Clone, Default)]
pub struct HistoryParams {
    /// Only include versions appended at or after this instant.
    pub since: Option<DateTime<Utc>>,

    /// Maximum number of versions to return.
    pub count: Option<usize>,
}

impl HistoryParams {
    /// Creates unrestricted history parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the since filter.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Sets the count limit.
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Returns true if a record passes the `since` filter.
    pub fn includes(&self, record: &VersionRecord) -> bool {
        self.since
            .is_none_or(|since| record.last_modified() >= since)
    }
}
