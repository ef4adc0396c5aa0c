//! The tabular store seam.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::SheetsError;

/// Rows of cells as the store returns and accepts them.
pub type Rows = Vec<Vec<Value>>;

/// One range write inside a batch update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeWrite {
    pub range: String,
    pub values: Rows,
}

impl RangeWrite {
    #[must_use]
    pub fn single(range: String, value: Value) -> Self {
        Self {
            range,
            values: vec![vec![value]],
        }
    }
}

/// Grid-shaped persistent store keyed by sheet title and A1 range.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Creates the sheet if absent. Returns `true` when it was created.
    async fn ensure_sheet(&self, title: &str) -> Result<bool, SheetsError>;

    /// Reads a range; trailing empty rows and cells are omitted.
    async fn read_range(&self, range: &str) -> Result<Rows, SheetsError>;

    async fn write_range(&self, range: &str, rows: Rows) -> Result<(), SheetsError>;

    /// Applies every write in one request.
    async fn batch_update(&self, writes: Vec<RangeWrite>) -> Result<(), SheetsError>;

    /// Appends rows after the last row of the table containing `range`.
    async fn append_rows(&self, range: &str, rows: Rows) -> Result<(), SheetsError>;
}

/// Text of a cell as displayed; blank for empty cells.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
