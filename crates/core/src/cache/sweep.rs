//! Retention sweep over runtime stores.
//!
//! Entries are aged by their response `date` header. An entry without a
//! parsable date is never considered expired.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::storage::CacheStorage;
use crate::Error;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SweepReport {
    /// Entries inspected across all swept stores.
    pub inspected: usize,
    /// URLs of deleted entries.
    pub removed: Vec<String>,
    /// Entries kept because their date header was missing or unreadable.
    pub undated: usize,
}

/// Parse an HTTP `date` header (IMF-fixdate, falling back to RFC 3339).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(value.trim()))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Delete entries in `stores` whose date is more than `max_age` before `now`.
pub async fn sweep_expired(
    storage: &dyn CacheStorage, stores: &[String], max_age: Duration, now: DateTime<Utc>,
) -> Result<SweepReport, Error> {
    let mut report = SweepReport::default();

    for store in stores {
        for entry in storage.entries(store).await? {
            report.inspected += 1;

            let Some(date) = entry.response.header("date").and_then(parse_http_date) else {
                report.undated += 1;
                continue;
            };

            if now - date > max_age && storage.delete_entry(store, &entry.key).await? {
                tracing::info!(store = %store, url = %entry.url, "removed expired cache entry");
                report.removed.push(entry.url);
            }
        }
    }

    Ok(report)
}
