//! Tab-separated data table: a header of field names, then one record per line.

use crate::error::TreeError;

/// Values of column `field`, one per non-blank record, in file order.
///
/// Records shorter than the header yield an empty value for the column.
pub fn column_rows(table: &str, field: &str) -> Result<Vec<String>, TreeError> {
    let mut lines = table.lines().filter(|l| !l.trim().is_empty());
    let header = match lines.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    let column = header
        .split('\t')
        .position(|name| name.trim() == field)
        .ok_or_else(|| TreeError::MissingField(field.to_string()))?;

    Ok(lines
        .map(|line| line.split('\t').nth(column).unwrap_or_default().to_string())
        .collect())
}

pub fn header(field: &str) -> String {
    format!("{}\n", field)
}
