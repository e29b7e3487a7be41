use super::error::ValidationError;
use super::model::{RawTable, REQUIRED_COLUMNS};

/// Check that every required column is present by exact name.
///
/// Reports all missing columns at once, in canonical order. Values are not
/// inspected here; type coercion belongs to the loader.
pub fn validate(table: &RawTable) -> Result<(), ValidationError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| table.column_index(col).is_none())
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns(missing))
    }
}
