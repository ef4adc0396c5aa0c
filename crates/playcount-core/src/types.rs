//! Domain types shared between the extraction engine and the tabular store.

use serde::{Deserialize, Serialize};

/// Literal written to a date cell when every engine failed for a target.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Fixed label of the store's first header cell.
pub const URL_HEADER: &str = "URL";

/// Engine identifier reported when the whole fallback chain was exhausted.
pub const ALL_ENGINES: &str = "all";

/// Classification of a single engine attempt against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
    Success,
    /// HTTP status >= 400, transport failure, or navigation timeout.
    NavigationError,
    /// Neither embedded data container was present.
    NoData,
    /// Data was present but no count field resolved.
    LookupError,
    /// Any other fault raised during the attempt.
    Exception,
}

impl AttemptOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::NavigationError => "navigationError",
            AttemptOutcome::NoData => "noData",
            AttemptOutcome::LookupError => "lookupError",
            AttemptOutcome::Exception => "exception",
        }
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value recorded in a date column: a count or the failure sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue {
    Count(u64),
    Error,
}

impl CellValue {
    #[must_use]
    pub fn count(self) -> Option<u64> {
        match self {
            CellValue::Count(n) => Some(n),
            CellValue::Error => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Count(n) => write!(f, "{n}"),
            CellValue::Error => f.write_str(ERROR_SENTINEL),
        }
    }
}

impl From<CellValue> for serde_json::Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Count(n) => serde_json::Value::from(n),
            CellValue::Error => serde_json::Value::from(ERROR_SENTINEL),
        }
    }
}

/// Final per-target result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    /// Canonical URL; the store's row key.
    pub target: String,
    pub value: CellValue,
    /// Engine that produced the value, or `all` when the chain was exhausted.
    pub engine: String,
    pub reason: String,
    /// Last observed HTTP status, if any.
    pub status: Option<u16>,
    /// Page length captured on a `noData` failure.
    pub page_length: Option<usize>,
}

impl TargetResult {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.value, CellValue::Error)
    }
}
