//! Reindexing bucket tables to a canonical row and column order.

use crate::data::BucketTable;
use crate::error::{BucketError, Result};
use crate::warning::Warning;
use nalgebra::DMatrix;
use std::collections::HashSet;

/// A reindexed table and the warnings raised while reindexing.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// The reordered table.
    pub table: BucketTable,
    /// One `UnknownBucket` warning per bucket outside the canonical order.
    pub warnings: Vec<Warning>,
}

/// Reorder rows to `row_order` and columns to `column_order`.
///
/// Canonical rows absent from `table` are filled with zeros. Rows of `table`
/// that are not in `row_order` are appended after the canonical rows in
/// their original order, each with a [`Warning::UnknownBucket`]. A column in
/// `column_order` that `table` lacks is a fatal `MissingColumn` error.
pub fn order_and_align<S: AsRef<str>, T: AsRef<str>>(
    table: &BucketTable,
    row_order: &[S],
    column_order: &[T],
) -> Result<Alignment> {
    check_unique(row_order, "bucket order")?;
    check_unique(column_order, "column order")?;

    let columns: Vec<usize> = column_order
        .iter()
        .map(|c| {
            table
                .sample_index(c.as_ref())
                .ok_or_else(|| BucketError::MissingColumn(c.as_ref().to_string()))
        })
        .collect::<Result<_>>()?;

    let canonical: HashSet<&str> = row_order.iter().map(|r| r.as_ref()).collect();
    let mut buckets: Vec<String> = row_order.iter().map(|r| r.as_ref().to_string()).collect();
    let mut warnings = Vec::new();
    for bucket in table.bucket_ids() {
        if !canonical.contains(bucket.as_str()) {
            let warning = Warning::UnknownBucket {
                bucket: bucket.clone(),
            };
            warning.emit();
            warnings.push(warning);
            buckets.push(bucket.clone());
        }
    }

    let mut data = DMatrix::zeros(buckets.len(), columns.len());
    for (i, bucket) in buckets.iter().enumerate() {
        if let Some(src) = table.bucket_index(bucket) {
            for (j, &col) in columns.iter().enumerate() {
                data[(i, j)] = table.get(src, col);
            }
        }
    }

    let samples = column_order.iter().map(|c| c.as_ref().to_string()).collect();
    Ok(Alignment {
        table: BucketTable::new(data, buckets, samples)?,
        warnings,
    })
}

fn check_unique<S: AsRef<str>>(names: &[S], what: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_ref()) {
            return Err(BucketError::InvalidParameter(format!(
                "'{}' appears twice in the {}",
                name.as_ref(),
                what
            )));
        }
    }
    Ok(())
}
