//! Share-of-column-total normalization.
//!
//! Converts bucket totals to relative abundances by dividing each value by
//! the total over all buckets in that sample, catch-all bucket included.
//! Every column with a non-zero total then sums to 1.

use super::{divide_columns, NormalizedTable};
use crate::data::BucketTable;
use crate::error::Result;
use crate::warning::Warning;

/// Maximum distance from 1 accepted for a normalized column sum.
pub const CLOSURE_TOLERANCE: f64 = 1e-6;

/// Divide every bucket by its sample's column total.
///
/// # Formula
/// For sample j: share(x_ij) = x_ij / sum_i(x_ij)
///
/// Columns with a zero total are left NaN and reported. Columns with a
/// non-zero total are checked to sum to 1 within [`CLOSURE_TOLERANCE`].
pub fn norm_share(table: &BucketTable) -> Result<NormalizedTable> {
    let column_totals = table.col_sums();
    let (normalized, mut warnings) = divide_columns(table, &column_totals)?;
    warnings.extend(check_closure(&normalized));

    Ok(NormalizedTable {
        table: normalized,
        method: "share of column total".to_string(),
        denominators: column_totals,
        warnings,
    })
}

/// Report every non-NaN column whose sum is not 1.
pub fn check_closure(normalized: &BucketTable) -> Vec<Warning> {
    normalized
        .col_sums()
        .into_iter()
        .zip(normalized.sample_ids())
        .filter(|(total, _)| !total.is_nan() && (total - 1.0).abs() > CLOSURE_TOLERANCE)
        .map(|(total, sample)| {
            let warning = Warning::ClosureViolation {
                sample: sample.clone(),
                total,
            };
            warning.emit();
            warning
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn create_test_table() -> BucketTable {
        // Sample S1: total = 100, S2: total = 200, S3: total = 0
        BucketTable::new(
            DMatrix::from_row_slice(3, 3, &[50.0, 100.0, 0.0, 30.0, 60.0, 0.0, 20.0, 40.0, 0.0]),
            vec!["A".into(), "B".into(), "Others".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_share_proportions() {
        let share = norm_share(&create_test_table()).unwrap();
        for j in 0..2 {
            assert_relative_eq!(share.table.get(0, j), 0.50, epsilon = 1e-10);
            assert_relative_eq!(share.table.get(1, j), 0.30, epsilon = 1e-10);
            assert_relative_eq!(share.table.get(2, j), 0.20, epsilon = 1e-10);
        }
        assert_eq!(share.denominators, vec![100.0, 200.0, 0.0]);
    }

    #[test]
    fn test_share_column_sums() {
        let share = norm_share(&create_test_table()).unwrap();
        let sums = share.table.col_sums();
        assert_relative_eq!(sums[0], 1.0, epsilon = CLOSURE_TOLERANCE);
        assert_relative_eq!(sums[1], 1.0, epsilon = CLOSURE_TOLERANCE);
    }

    #[test]
    fn test_share_zero_total_is_nan_and_reported() {
        let share = norm_share(&create_test_table()).unwrap();
        for i in 0..3 {
            assert!(share.table.get(i, 2).is_nan());
        }
        assert_eq!(
            share.warnings,
            vec![Warning::ZeroDenominator {
                sample: "S3".into()
            }]
        );
    }

    #[test]
    fn test_closure_violation_reported() {
        let broken = BucketTable::new(
            DMatrix::from_row_slice(2, 1, &[0.5, 0.4]),
            vec!["A".into(), "B".into()],
            vec!["S1".into()],
        )
        .unwrap();
        let warnings = check_closure(&broken);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            Warning::ClosureViolation { ref sample, .. } if sample == "S1"
        ));
    }

    #[test]
    fn test_worked_example() {
        // Deltaproteobacteria {A:10, B:0}, Firmicutes {A:10, B:10}
        let table = BucketTable::new(
            DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 10.0, 10.0]),
            vec!["Deltaproteobacteria".into(), "Firmicutes".into()],
            vec!["A".into(), "B".into()],
        )
        .unwrap();
        let share = norm_share(&table).unwrap();
        assert_eq!(share.table.value("Deltaproteobacteria", "A"), Some(0.5));
        assert_eq!(share.table.value("Deltaproteobacteria", "B"), Some(0.0));
        assert_eq!(share.table.value("Firmicutes", "A"), Some(0.5));
        assert_eq!(share.table.value("Firmicutes", "B"), Some(1.0));
        assert!(share.warnings.is_empty());
    }
}
