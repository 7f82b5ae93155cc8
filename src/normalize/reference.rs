//! Ratio-to-reference normalization.
//!
//! Divides each bucket by the summed abundance of a reference subset of the
//! input, typically a single-copy marker gene such as RpS3:
//!
//! ```text
//! normalized_ij = bucket_ij / reference_j
//! ```
//!
//! The result is a per-genome estimate rather than a share, so columns do
//! not sum to 1 and no closure check applies.
//!
//! # Example
//!
//! ```ignore
//! use taxon_buckets::filter::RowFilter;
//! use taxon_buckets::normalize::{norm_reference, reference_totals};
//!
//! let rps3 = RowFilter::Equals {
//!     column: "Functional_annotation_short_blast_or_tree_placement".into(),
//!     value: "RpS3".into(),
//! };
//! let reference = reference_totals(&table, &axis, &[rps3], NumericPolicy::CoerceToZero)?;
//! let normalized = norm_reference(&totals, &reference)?;
//! ```

use super::{divide_columns, NormalizedTable};
use crate::data::{AbundanceTable, BucketTable, NumericPolicy, SampleAxis};
use crate::error::Result;
use crate::filter::{filter_rows, RowFilter};

/// Per-sample summed abundance of the rows selected by `reference`.
///
/// The filters are applied to `table` as given, independent of any filters
/// used to select the records being classified.
pub fn reference_totals(
    table: &AbundanceTable,
    axis: &SampleAxis,
    reference: &[RowFilter],
    policy: NumericPolicy,
) -> Result<Vec<f64>> {
    let selected = filter_rows(table, reference)?;
    let totals = selected.sample_totals(axis, policy)?;
    tracing::debug!(
        "Reference subset: {} records, totals {:?}",
        selected.n_records(),
        totals
    );
    Ok(totals)
}

/// Divide every bucket by the reference total of its sample.
///
/// Samples whose reference total is zero are left NaN and reported.
pub fn norm_reference(table: &BucketTable, reference: &[f64]) -> Result<NormalizedTable> {
    let (normalized, warnings) = divide_columns(table, reference)?;
    Ok(NormalizedTable {
        table: normalized,
        method: "ratio to reference total".to_string(),
        denominators: reference.to_vec(),
        warnings,
    })
}
