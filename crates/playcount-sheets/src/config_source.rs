use crate::a1;
use crate::error::SheetsError;
use crate::store::{cell_text, TabularStore};

/// Reads target URLs from column A of the config sheet, below the header row.
/// Entries are trimmed; blank cells are discarded; order is preserved.
///
/// # Errors
///
/// Propagates any store failure.
pub async fn read_targets(store: &dyn TabularStore, sheet: &str) -> Result<Vec<String>, SheetsError> {
    let rows = store.read_range(&a1::range(sheet, "A2:A")).await?;
    let targets: Vec<String> = rows
        .iter()
        .filter_map(|row| row.first())
        .map(|cell| cell_text(cell).trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    tracing::debug!(sheet, count = targets.len(), "targets loaded");
    Ok(targets)
}
