//! Per-sample normalization of bucket tables.
//!
//! Three modes are supported:
//!
//! - **Share of total**: each bucket divided by its sample's total over all
//!   buckets, so every column sums to 1
//! - **Ratio to reference**: each bucket divided by an external per-sample
//!   reference total (e.g. summed RpS3 abundance)
//! - **Raw**: values pass through unchanged
//!
//! A zero denominator never becomes zero: the column is left NaN and a
//! [`Warning::ZeroDenominator`] names the sample.

pub mod reference;
pub mod share;

pub use reference::{norm_reference, reference_totals};
pub use share::{check_closure, norm_share, CLOSURE_TOLERANCE};

use crate::data::{BucketTable, SampleAxis};
use crate::error::{BucketError, Result};
use crate::warning::Warning;
use serde::{Deserialize, Serialize};

/// Normalization mode with its resolved inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalization {
    /// Divide by the column total over all buckets.
    ShareOfTotal,
    /// Divide by a per-sample reference total, in axis order.
    RatioToReference(Vec<f64>),
    /// Leave values unchanged.
    Raw,
}

/// A normalized bucket table with its denominators and warnings.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    /// The normalized values.
    pub table: BucketTable,
    /// Human-readable description of the normalization applied.
    pub method: String,
    /// Per-sample denominators (all 1.0 for raw values).
    pub denominators: Vec<f64>,
    /// Warnings raised while normalizing.
    pub warnings: Vec<Warning>,
}

/// Normalize a bucket table whose columns follow `axis`.
///
/// # Errors
/// `MissingColumn` if the table's columns are not exactly the axis ids, and
/// `DimensionMismatch` if a reference vector has the wrong length.
pub fn normalize(
    table: &BucketTable,
    axis: &SampleAxis,
    mode: &Normalization,
) -> Result<NormalizedTable> {
    if table.sample_ids() != axis.ids() {
        let missing = axis
            .ids()
            .iter()
            .find(|id| table.sample_index(id).is_none())
            .cloned()
            .unwrap_or_else(|| format!("{:?}", axis.ids()));
        return Err(BucketError::MissingColumn(missing));
    }

    match mode {
        Normalization::ShareOfTotal => norm_share(table),
        Normalization::RatioToReference(reference) => norm_reference(table, reference),
        Normalization::Raw => Ok(NormalizedTable {
            table: table.clone(),
            method: "raw".to_string(),
            denominators: vec![1.0; table.n_samples()],
            warnings: Vec::new(),
        }),
    }
}

/// Divide each column by its denominator; zero denominators give NaN columns.
pub(crate) fn divide_columns(
    table: &BucketTable,
    denominators: &[f64],
) -> Result<(BucketTable, Vec<Warning>)> {
    if denominators.len() != table.n_samples() {
        return Err(BucketError::DimensionMismatch {
            expected: table.n_samples(),
            actual: denominators.len(),
        });
    }

    let mut data = table.matrix().clone();
    let mut warnings = Vec::new();
    for (j, &denom) in denominators.iter().enumerate() {
        if denom == 0.0 {
            let warning = Warning::ZeroDenominator {
                sample: table.sample_ids()[j].clone(),
            };
            warning.emit();
            warnings.push(warning);
            data.column_mut(j).fill(f64::NAN);
        } else {
            data.column_mut(j).iter_mut().for_each(|v| *v /= denom);
        }
    }

    let normalized = BucketTable::new(
        data,
        table.bucket_ids().to_vec(),
        table.sample_ids().to_vec(),
    )?;
    Ok((normalized, warnings))
}

/// Serializable choice of normalization, resolved against the input table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NormalizationSpec {
    /// Share of column total.
    #[default]
    ShareOfTotal,
    /// Ratio to the summed abundance of rows selected by `reference`.
    RatioToReference {
        reference: Vec<crate::filter::RowFilter>,
    },
    /// No normalization.
    Raw,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn table() -> BucketTable {
        BucketTable::new(
            DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 10.0, 10.0]),
            vec!["Deltaproteobacteria".into(), "Firmicutes".into()],
            vec!["A".into(), "B".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_dispatch() {
        let axis = SampleAxis::new(&["A", "B"]).unwrap();

        let share = normalize(&table(), &axis, &Normalization::ShareOfTotal).unwrap();
        assert_relative_eq!(share.table.get(0, 0), 0.5);

        let ratio = normalize(
            &table(),
            &axis,
            &Normalization::RatioToReference(vec![100.0, 40.0]),
        )
        .unwrap();
        assert_relative_eq!(ratio.table.get(1, 1), 0.25);

        let raw = normalize(&table(), &axis, &Normalization::Raw).unwrap();
        assert_eq!(raw.table, table());
        assert_eq!(raw.denominators, vec![1.0, 1.0]);
    }

    #[test]
    fn test_normalize_rejects_foreign_axis() {
        let axis = SampleAxis::new(&["A", "C"]).unwrap();
        let result = normalize(&table(), &axis, &Normalization::Raw);
        assert!(matches!(result, Err(BucketError::MissingColumn(ref c)) if c == "C"));
    }

    #[test]
    fn test_divide_columns_zero_denominator() {
        let (out, warnings) = divide_columns(&table(), &[20.0, 0.0]).unwrap();
        assert_relative_eq!(out.get(0, 0), 0.5);
        assert!(out.get(0, 1).is_nan());
        assert!(out.get(1, 1).is_nan());
        assert_eq!(
            warnings,
            vec![Warning::ZeroDenominator { sample: "B".into() }]
        );
    }

    #[test]
    fn test_spec_yaml() {
        let spec: NormalizationSpec = serde_yaml::from_str(
            "mode: ratio_to_reference\nreference:\n  - kind: equals\n    column: annotation\n    value: RpS3\n",
        )
        .unwrap();
        assert!(matches!(spec, NormalizationSpec::RatioToReference { ref reference } if reference.len() == 1));
    }
}
