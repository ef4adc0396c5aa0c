//! Date-column header maintenance.
//!
//! Column A is always labelled `URL`. Date labels are only ever appended to
//! the right of the existing header; an existing label for the date is reused.

use playcount_core::URL_HEADER;
use serde_json::Value;

use crate::a1;
use crate::error::SheetsError;
use crate::store::{cell_text, RangeWrite, TabularStore};

/// Where today's column lives and whether it has to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPlan {
    pub header: Vec<String>,
    /// 0-based column index of today's date.
    pub today_index: usize,
    /// `true` when the date label is new and must be written.
    pub appended: bool,
}

/// Plans today's column against the current header row.
#[must_use]
pub fn plan_header(existing: &[Value], today: &str) -> HeaderPlan {
    let mut header: Vec<String> = existing.iter().map(cell_text).collect();
    if header.is_empty() {
        header.push(URL_HEADER.to_string());
    } else {
        header[0] = URL_HEADER.to_string();
    }

    if let Some(offset) = header.iter().skip(1).position(|label| label.trim() == today) {
        return HeaderPlan {
            header,
            today_index: offset + 1,
            appended: false,
        };
    }

    header.push(today.to_string());
    let today_index = header.len() - 1;
    HeaderPlan {
        header,
        today_index,
        appended: true,
    }
}

/// Reads the header row of `sheet` and plans today's column without writing.
///
/// # Errors
///
/// Propagates any store failure.
pub async fn read_header_plan(
    store: &dyn TabularStore,
    sheet: &str,
    today: &str,
) -> Result<HeaderPlan, SheetsError> {
    let rows = store.read_range(&a1::row(sheet, 1)).await?;
    let existing = rows.into_iter().next().unwrap_or_default();
    Ok(plan_header(&existing, today))
}

/// Labels `A1` as `URL` and makes sure today's date column exists.
/// Returns the 0-based index of today's column.
///
/// Idempotent for a given date: a second call finds the label and writes
/// only the `URL` cell.
///
/// # Errors
///
/// Propagates any store failure.
pub async fn ensure_views_header(
    store: &dyn TabularStore,
    sheet: &str,
    today: &str,
) -> Result<usize, SheetsError> {
    let mut writes = vec![RangeWrite::single(
        a1::cell(sheet, 0, 1),
        Value::from(URL_HEADER),
    )];

    let plan = read_header_plan(store, sheet, today).await?;
    if plan.appended {
        writes.push(RangeWrite::single(
            a1::cell(sheet, plan.today_index, 1),
            Value::from(today),
        ));
        tracing::info!(sheet, date = today, column = plan.today_index, "added date column");
    }

    store.batch_update(writes).await?;
    Ok(plan.today_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_header_gets_url_and_today() {
        let plan = plan_header(&[], "2024-05-01");
        assert_eq!(plan.header, vec!["URL", "2024-05-01"]);
        assert_eq!(plan.today_index, 1);
        assert!(plan.appended);
    }

    #[test]
    fn existing_date_is_reused() {
        let existing = [json!("URL"), json!("2024-04-30"), json!("2024-05-01")];
        let plan = plan_header(&existing, "2024-05-01");
        assert_eq!(plan.today_index, 2);
        assert!(!plan.appended);
        assert_eq!(plan.header.len(), 3);
    }

    #[test]
    fn new_date_is_appended_after_existing_labels() {
        let existing = [json!("URL"), json!("2024-04-29"), json!("2024-04-30")];
        let plan = plan_header(&existing, "2024-05-01");
        assert_eq!(plan.today_index, 3);
        assert_eq!(plan.header[..3], ["URL", "2024-04-29", "2024-04-30"]);
    }

    #[test]
    fn first_cell_is_forced_to_url() {
        let existing = [json!("link"), json!("2024-04-30")];
        let plan = plan_header(&existing, "2024-04-30");
        assert_eq!(plan.header[0], "URL");
        assert_eq!(plan.today_index, 1);
    }

    #[test]
    fn url_label_is_never_mistaken_for_a_date() {
        let plan = plan_header(&[json!("URL")], "URL");
        assert_eq!(plan.today_index, 1);
        assert!(plan.appended);
    }

    #[test]
    fn planning_twice_is_idempotent() {
        let first = plan_header(&[json!("URL")], "2024-05-01");
        let written: Vec<Value> = first.header.iter().map(|s| json!(s)).collect();
        let second = plan_header(&written, "2024-05-01");
        assert!(!second.appended);
        assert_eq!(second.header, first.header);
    }
}
