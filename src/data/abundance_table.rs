//! Delimited abundance tables with free-text classification columns.

use super::SampleAxis;
use crate::error::{BucketError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell contents treated as missing, in both label and sample columns.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a trimmed cell holds one of the missing-value markers.
pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// How to treat sample cells that are not numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Malformed cells count as zero.
    #[default]
    CoerceToZero,
    /// Malformed cells abort the run. Missing markers still count as zero.
    Strict,
}

/// A single classified row: its labels and its sample vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    labels: Vec<Option<String>>,
    values: Vec<f64>,
}

impl Record {
    /// Create a record from labels (one per classification column) and values.
    pub fn new(labels: Vec<Option<String>>, values: Vec<f64>) -> Self {
        Self { labels, values }
    }

    /// Convenience constructor for a record with a single label.
    pub fn labelled(label: &str, values: Vec<f64>) -> Self {
        Self::new(vec![Some(label.to_string())], values)
    }

    /// All labels present on this record, skipping absent ones.
    pub fn labels(&self) -> Vec<&str> {
        self.labels.iter().flatten().map(String::as_str).collect()
    }

    /// First label present on this record.
    pub fn first_label(&self) -> Option<&str> {
        self.labels.iter().flatten().next().map(String::as_str)
    }

    /// Sample values in axis order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sum of the sample vector.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// A parsed delimited table: header plus raw string rows.
///
/// Cells are kept as text; sample columns are coerced to numbers only when
/// records are extracted against a [`SampleAxis`].
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl AbundanceTable {
    /// Create a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<StringRecord>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        Self { headers, rows }
    }

    /// Load a table from a delimited file.
    ///
    /// Expected format:
    /// - First row: column headers (surrounding whitespace is stripped)
    /// - Subsequent rows: one record each; short rows are padded with missing cells
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    /// Load a table from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(BucketError::EmptyData("Table has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }

        if rows.is_empty() {
            return Err(BucketError::EmptyData("No records in table".to_string()));
        }

        Ok(Self::new(headers, rows))
    }

    /// Column headers.
    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    #[inline]
    pub fn n_records(&self) -> usize {
        self.rows.len()
    }

    /// Index of a named column, or a `MissingColumn` error.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| BucketError::MissingColumn(name.to_string()))
    }

    /// Resolve several column names at once, failing on the first missing one.
    pub fn column_indices<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.column_index(n.as_ref())).collect()
    }

    /// Text of a cell, or `None` when the cell is absent or a missing marker.
    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(str::trim)
            .filter(|cell| !is_missing(cell))
    }

    /// Numeric value of a cell under the given policy.
    ///
    /// Returns the value and whether the cell had to be coerced to zero.
    pub fn number(&self, row: usize, col: usize, policy: NumericPolicy) -> Result<(f64, bool)> {
        let cell = match self.text(row, col) {
            Some(cell) => cell,
            None => return Ok((0.0, true)),
        };
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok((v, false)),
            _ => match policy {
                NumericPolicy::CoerceToZero => Ok((0.0, true)),
                NumericPolicy::Strict => Err(BucketError::InvalidNumber {
                    value: cell.to_string(),
                    row,
                    column: self.headers.get(col).cloned().unwrap_or_default(),
                }),
            },
        }
    }

    /// Keep only the rows at the given indices, in the given order.
    pub fn subset_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut rows = Vec::with_capacity(indices.len());
        for &idx in indices {
            let row = self.rows.get(idx).ok_or_else(|| {
                BucketError::InvalidParameter(format!("Row index {} out of bounds", idx))
            })?;
            rows.push(row.clone());
        }
        Ok(Self {
            headers: self.headers.clone(),
            rows,
        })
    }

    /// Extract classified records.
    ///
    /// Every sample column of `axis` and every column in `label_columns` must
    /// exist; a missing one is fatal and nothing is extracted.
    pub fn records<S: AsRef<str>>(
        &self,
        axis: &SampleAxis,
        label_columns: &[S],
        policy: NumericPolicy,
    ) -> Result<Vec<Record>> {
        let sample_cols = self.column_indices(axis.columns())?;
        let label_cols = self.column_indices(label_columns)?;

        let mut coerced = 0usize;
        let mut records = Vec::with_capacity(self.n_records());
        for row in 0..self.n_records() {
            let labels = label_cols
                .iter()
                .map(|&c| self.text(row, c).map(str::to_string))
                .collect();
            let mut values = Vec::with_capacity(sample_cols.len());
            for &c in &sample_cols {
                let (value, was_coerced) = self.number(row, c, policy)?;
                if was_coerced {
                    coerced += 1;
                }
                values.push(value);
            }
            records.push(Record::new(labels, values));
        }

        if coerced > 0 {
            tracing::debug!(
                "{} missing or non-numeric sample cells coerced to zero",
                coerced
            );
        }
        Ok(records)
    }

    /// Per-sample totals over every row of the table.
    pub fn sample_totals(&self, axis: &SampleAxis, policy: NumericPolicy) -> Result<Vec<f64>> {
        let sample_cols = self.column_indices(axis.columns())?;
        let mut totals = vec![0.0; sample_cols.len()];
        for row in 0..self.n_records() {
            for (j, &c) in sample_cols.iter().enumerate() {
                totals[j] += self.number(row, c, policy)?.0;
            }
        }
        Ok(totals)
    }

    /// Per-sample count of cells that were missing or non-numeric.
    pub fn coerced_cells(&self, axis: &SampleAxis) -> Result<Vec<usize>> {
        let sample_cols = self.column_indices(axis.columns())?;
        let mut counts = vec![0usize; sample_cols.len()];
        for row in 0..self.n_records() {
            for (j, &c) in sample_cols.iter().enumerate() {
                if self.number(row, c, NumericPolicy::CoerceToZero)?.1 {
                    counts[j] += 1;
                }
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE: &str = "\
taxonomy , A,B
Deltaproteobacteria,10,0
Firmicutes,10,10
,5,oops
\"Chloroflexi, Anaerolineae\",NA,2.5
";

    fn create_test_table() -> AbundanceTable {
        AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap()
    }

    #[test]
    fn test_headers_are_trimmed() {
        let table = create_test_table();
        assert_eq!(table.headers(), &["taxonomy", "A", "B"]);
        assert_eq!(table.n_records(), 4);
    }

    #[test]
    fn test_text_missing_markers() {
        let table = create_test_table();
        assert_eq!(table.text(0, 0), Some("Deltaproteobacteria"));
        assert_eq!(table.text(2, 0), None);
        assert_eq!(table.text(3, 1), None);
        assert_eq!(table.text(3, 0), Some("Chloroflexi, Anaerolineae"));
    }

    #[test]
    fn test_records_coerce_to_zero() {
        let table = create_test_table();
        let axis = SampleAxis::new(&["A", "B"]).unwrap();
        let records = table
            .records(&axis, &["taxonomy"], NumericPolicy::CoerceToZero)
            .unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].values(), &[10.0, 0.0]);
        assert_eq!(records[2].values(), &[5.0, 0.0]);
        assert_eq!(records[2].first_label(), None);
        assert_eq!(records[3].values(), &[0.0, 2.5]);
    }

    #[test]
    fn test_records_strict_policy() {
        let table = create_test_table();
        let axis = SampleAxis::new(&["A", "B"]).unwrap();
        let result = table.records(&axis, &["taxonomy"], NumericPolicy::Strict);
        match result {
            Err(BucketError::InvalidNumber { value, row, column }) => {
                assert_eq!(value, "oops");
                assert_eq!(row, 2);
                assert_eq!(column, "B");
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_sample_column_is_fatal() {
        let table = create_test_table();
        let axis = SampleAxis::new(&["A", "C"]).unwrap();
        let result = table.records(&axis, &["taxonomy"], NumericPolicy::CoerceToZero);
        assert!(matches!(result, Err(BucketError::MissingColumn(ref c)) if c == "C"));
    }

    #[test]
    fn test_missing_label_column_is_fatal() {
        let table = create_test_table();
        let axis = SampleAxis::new(&["A", "B"]).unwrap();
        let result = table.records(&axis, &["kingdom"], NumericPolicy::CoerceToZero);
        assert!(matches!(result, Err(BucketError::MissingColumn(ref c)) if c == "kingdom"));
    }

    #[test]
    fn test_sample_totals_and_coerced_cells() {
        let table = create_test_table();
        let axis = SampleAxis::new(&["A", "B"]).unwrap();
        let totals = table
            .sample_totals(&axis, NumericPolicy::CoerceToZero)
            .unwrap();
        assert_eq!(totals, vec![25.0, 12.5]);
        assert_eq!(table.coerced_cells(&axis).unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_subset_rows() {
        let table = create_test_table();
        let subset = table.subset_rows(&[1, 0]).unwrap();
        assert_eq!(subset.n_records(), 2);
        assert_eq!(subset.text(0, 0), Some("Firmicutes"));
        assert!(table.subset_rows(&[9]).is_err());
    }

    #[test]
    fn test_tab_delimited_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id\tS1\tS2").unwrap();
        writeln!(file, "x\t1\t2").unwrap();
        writeln!(file, "y\t3").unwrap();
        file.flush().unwrap();

        let table = AbundanceTable::from_path(file.path(), b'\t').unwrap();
        let axis = SampleAxis::new(&["S1", "S2"]).unwrap();
        let records = table
            .records(&axis, &["id"], NumericPolicy::CoerceToZero)
            .unwrap();
        assert_eq!(records[1].values(), &[3.0, 0.0]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let result = AbundanceTable::from_reader("a,b\n".as_bytes(), b',');
        assert!(matches!(result, Err(BucketError::EmptyData(_))));
    }
}
