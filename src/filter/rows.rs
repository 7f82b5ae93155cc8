//! Row selection on label columns, applied before classification.

use crate::data::AbundanceTable;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A predicate on one text column of the input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowFilter {
    /// Cell contains `pattern`, ignoring case. Missing cells are rejected.
    Contains { column: String, pattern: String },
    /// Cell equals `value` exactly.
    Equals { column: String, value: String },
    /// Cell equals one of `values` exactly.
    OneOf { column: String, values: Vec<String> },
    /// Cell is present.
    NotMissing { column: String },
    /// Cell differs from `value`. Missing cells are kept.
    NotEqual { column: String, value: String },
}

impl RowFilter {
    /// Column this filter reads.
    pub fn column(&self) -> &str {
        match self {
            RowFilter::Contains { column, .. }
            | RowFilter::Equals { column, .. }
            | RowFilter::OneOf { column, .. }
            | RowFilter::NotMissing { column }
            | RowFilter::NotEqual { column, .. } => column,
        }
    }

    /// Whether a row with this cell passes the filter.
    pub fn keep(&self, cell: Option<&str>) -> bool {
        match (self, cell) {
            (RowFilter::Contains { pattern, .. }, Some(cell)) => {
                cell.to_lowercase().contains(&pattern.to_lowercase())
            }
            (RowFilter::Equals { value, .. }, Some(cell)) => cell == value,
            (RowFilter::OneOf { values, .. }, Some(cell)) => values.iter().any(|v| v == cell),
            (RowFilter::NotMissing { .. }, Some(_)) => true,
            (RowFilter::NotEqual { value, .. }, Some(cell)) => cell != value,
            (RowFilter::NotEqual { .. }, None) => true,
            (_, None) => false,
        }
    }
}

/// Indices of rows passing every filter, in table order.
///
/// Every filter column must exist; a missing one is fatal.
pub fn select_rows(table: &AbundanceTable, filters: &[RowFilter]) -> Result<Vec<usize>> {
    let columns: Vec<usize> = filters
        .iter()
        .map(|f| table.column_index(f.column()))
        .collect::<Result<_>>()?;

    Ok((0..table.n_records())
        .filter(|&row| {
            filters
                .iter()
                .zip(&columns)
                .all(|(f, &col)| f.keep(table.text(row, col)))
        })
        .collect())
}

/// Keep only rows passing every filter.
pub fn filter_rows(table: &AbundanceTable, filters: &[RowFilter]) -> Result<AbundanceTable> {
    if filters.is_empty() {
        return Ok(table.clone());
    }
    let keep = select_rows(table, filters)?;
    tracing::debug!(
        "Row filters kept {} of {} records",
        keep.len(),
        table.n_records()
    );
    table.subset_rows(&keep)
}
