//! Reconciles a run's results against the rows already in the store.
//!
//! Planning is pure; applying issues exactly two store calls, cell updates
//! first and appends second.

use std::collections::HashMap;

use playcount_core::TargetResult;
use serde_json::Value;

use crate::a1;
use crate::error::SheetsError;
use crate::store::{cell_text, RangeWrite, Rows, TabularStore};

/// First data row; row 1 is the header.
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertPlan {
    /// One single-cell write per result whose URL already has a row.
    pub updates: Vec<RangeWrite>,
    /// New rows, in first-seen order.
    pub appends: Rows,
}

impl UpsertPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.appends.is_empty()
    }
}

/// Plans the writes for `results`.
///
/// `existing_keys` are the column-A cells from row 2 downward, as read from
/// the store. When a URL occurs more than once there, the first row wins.
/// A new URL repeated within `results` yields one appended row carrying the
/// last value.
#[must_use]
pub fn plan_upsert(
    sheet: &str,
    results: &[TargetResult],
    today_index: usize,
    existing_keys: &[Vec<Value>],
) -> UpsertPlan {
    let today_index = today_index.max(1);

    let mut rows_by_url: HashMap<String, usize> = HashMap::new();
    for (offset, row) in existing_keys.iter().enumerate() {
        let Some(url) = row.first().map(|cell| cell_text(cell).trim().to_string()) else {
            continue;
        };
        if !url.is_empty() {
            rows_by_url.entry(url).or_insert(FIRST_DATA_ROW + offset);
        }
    }

    let mut plan = UpsertPlan::default();
    let mut pending: HashMap<&str, usize> = HashMap::new();

    for result in results {
        let value = Value::from(result.value);

        if let Some(&row) = rows_by_url.get(result.target.as_str()) {
            plan.updates
                .push(RangeWrite::single(a1::cell(sheet, today_index, row), value));
        } else if let Some(&index) = pending.get(result.target.as_str()) {
            plan.appends[index][today_index] = value;
        } else {
            let mut row = Vec::with_capacity(today_index + 1);
            row.push(Value::from(result.target.clone()));
            row.resize(today_index, Value::from(""));
            row.push(value);
            pending.insert(result.target.as_str(), plan.appends.len());
            plan.appends.push(row);
        }
    }

    plan
}

/// Applies a plan: all cell updates in one batch, then all appends in one
/// batch.
///
/// # Errors
///
/// Propagates any store failure; appends are not attempted if the update
/// batch fails.
pub async fn apply_upsert(
    store: &dyn TabularStore,
    sheet: &str,
    plan: UpsertPlan,
) -> Result<(), SheetsError> {
    let updated = plan.updates.len();
    let appended = plan.appends.len();

    store.batch_update(plan.updates).await?;
    store.append_rows(&a1::range(sheet, "A1"), plan.appends).await?;

    tracing::info!(sheet, updated, appended, "upsert applied");
    Ok(())
}

#[cfg(test)]
#[path = "upsert_test.rs"]
mod tests;
