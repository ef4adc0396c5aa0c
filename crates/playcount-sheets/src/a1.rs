//! A1-notation helpers.

/// Converts a 1-based column number to its letters (`1 → A`, `27 → AA`).
/// Column 0 has no letters and yields an empty string.
#[must_use]
pub fn column_letters(number: usize) -> String {
    let mut n = number;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = u8::try_from((n - 1) % 26).unwrap_or_default();
        letters.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quotes a sheet title for use in a range when it is not a plain identifier.
#[must_use]
pub fn quote_sheet(title: &str) -> String {
    let plain = !title.is_empty() && title.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        title.to_string()
    } else {
        format!("'{}'", title.replace('\'', "''"))
    }
}

/// `Sheet!<a1>` range string.
#[must_use]
pub fn range(sheet: &str, a1: &str) -> String {
    format!("{}!{a1}", quote_sheet(sheet))
}

/// Single-cell range for a 0-based column index and a 1-based row number.
#[must_use]
pub fn cell(sheet: &str, column_index: usize, row: usize) -> String {
    range(sheet, &format!("{}{row}", column_letters(column_index + 1)))
}

/// Whole-row range, e.g. `Views!1:1`.
#[must_use]
pub fn row(sheet: &str, row: usize) -> String {
    range(sheet, &format!("{row}:{row}"))
}
