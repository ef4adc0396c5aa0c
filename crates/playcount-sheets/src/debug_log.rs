//! Append-only diagnostics for failed targets.

use chrono::{DateTime, Utc};
use playcount_core::{iso_timestamp_utc, TargetResult};
use serde_json::Value;

use crate::a1;
use crate::error::SheetsError;
use crate::store::{Rows, TabularStore};

/// `[timestamp, target, engine, status, pageLength, reason]`
#[must_use]
pub fn debug_row(result: &TargetResult, at: DateTime<Utc>) -> Vec<Value> {
    vec![
        Value::from(iso_timestamp_utc(at)),
        Value::from(result.target.clone()),
        Value::from(result.engine.clone()),
        result.status.map_or_else(|| Value::from(""), Value::from),
        result.page_length.map_or_else(|| Value::from(""), Value::from),
        Value::from(result.reason.clone()),
    ]
}

/// Rows for every failed result, in input order.
#[must_use]
pub fn failure_rows(results: &[TargetResult], at: DateTime<Utc>) -> Rows {
    results
        .iter()
        .filter(|r| r.is_failure())
        .map(|r| debug_row(r, at))
        .collect()
}

/// Appends one debug record per failed result. Returns the number recorded.
///
/// # Errors
///
/// Propagates any store failure.
pub async fn record_failures(
    store: &dyn TabularStore,
    sheet: &str,
    results: &[TargetResult],
    at: DateTime<Utc>,
) -> Result<usize, SheetsError> {
    let rows = failure_rows(results, at);
    let count = rows.len();
    if count > 0 {
        store.append_rows(&a1::range(sheet, "A1"), rows).await?;
        tracing::info!(sheet, count, "debug records appended");
    }
    Ok(count)
}
