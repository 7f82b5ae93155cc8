//! Input table profiling: per-sample totals and data-quality counts.

use crate::data::{AbundanceTable, NumericPolicy, SampleAxis};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Profile of the sample columns of an abundance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    /// Number of records (rows).
    pub n_records: usize,
    /// Sample ids, in axis order.
    pub samples: Vec<String>,
    /// Summed abundance per sample, malformed cells counted as zero.
    pub totals: Vec<f64>,
    /// Missing or non-numeric cells per sample.
    pub coerced_cells: Vec<usize>,
    /// Samples whose total is zero.
    pub zero_total_samples: Vec<String>,
}

impl TableProfile {
    /// Total number of coerced cells.
    pub fn n_coerced(&self) -> usize {
        self.coerced_cells.iter().sum()
    }

    /// Whether a share normalization would leave any column NaN.
    pub fn has_zero_totals(&self) -> bool {
        !self.zero_total_samples.is_empty()
    }
}

impl std::fmt::Display for TableProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Table Profile")?;
        writeln!(f, "  Records: {}", self.n_records)?;
        writeln!(f, "  Samples: {}", self.samples.len())?;
        writeln!(f, "  Coerced cells: {}", self.n_coerced())?;
        for ((sample, total), coerced) in self
            .samples
            .iter()
            .zip(&self.totals)
            .zip(&self.coerced_cells)
        {
            writeln!(f, "    {:<10} total {:>14.4}  coerced {}", sample, total, coerced)?;
        }
        if self.has_zero_totals() {
            writeln!(f, "  Zero-total samples: {}", self.zero_total_samples.join(", "))?;
        }
        Ok(())
    }
}

/// Profile the sample columns of `table` named by `axis`.
pub fn profile_table(table: &AbundanceTable, axis: &SampleAxis) -> Result<TableProfile> {
    let totals = table.sample_totals(axis, NumericPolicy::CoerceToZero)?;
    let coerced_cells = table.coerced_cells(axis)?;
    let zero_total_samples = axis
        .ids()
        .iter()
        .zip(&totals)
        .filter(|(_, &t)| t == 0.0)
        .map(|(id, _)| id.clone())
        .collect();

    Ok(TableProfile {
        n_records: table.n_records(),
        samples: axis.ids().to_vec(),
        totals,
        coerced_cells,
        zero_total_samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TABLE: &str = "\
taxonomy,3_cm,40_cm,153_cm
Firmicutes,10,n/a,0
Bacteroidetes,2.5,,0
";

    #[test]
    fn test_profile_table() {
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let axis = SampleAxis::new(&["3_cm", "40_cm", "153_cm"]).unwrap();
        let profile = profile_table(&table, &axis).unwrap();

        assert_eq!(profile.n_records, 2);
        assert_relative_eq!(profile.totals[0], 12.5);
        assert_eq!(profile.coerced_cells, vec![0, 2, 0]);
        assert_eq!(profile.n_coerced(), 2);
        assert_eq!(profile.zero_total_samples, vec!["40_cm", "153_cm"]);
        assert!(profile.has_zero_totals());
    }

    #[test]
    fn test_profile_display_and_json() {
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let axis = SampleAxis::new(&["3_cm"]).unwrap();
        let profile = profile_table(&table, &axis).unwrap();

        let text = profile.to_string();
        assert!(text.contains("Records: 2"));
        assert!(!text.contains("Zero-total"));

        let json = serde_json::to_string(&profile).unwrap();
        let back: TableProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_missing_sample_column() {
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let axis = SampleAxis::new(&["738_cm"]).unwrap();
        assert!(profile_table(&table, &axis).is_err());
    }
}
