//! Per-bucket accumulators and dense bucket × sample tables.

use crate::error::{BucketError, Result};
use nalgebra::DMatrix;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Most decimal places an `f64` table can be rounded to.
pub const MAX_DECIMALS: u32 = 15;

/// Insertion-ordered per-bucket sums of sample vectors.
///
/// A bucket exists once something has been added to it and starts at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTotals {
    buckets: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<Vec<f64>>,
    n_samples: usize,
}

impl BucketTotals {
    /// Create empty totals for vectors of `n_samples` values.
    pub fn new(n_samples: usize) -> Self {
        Self {
            buckets: Vec::new(),
            index: HashMap::new(),
            values: Vec::new(),
            n_samples,
        }
    }

    /// Add a sample vector to a bucket, creating the bucket at zero if needed.
    pub fn add(&mut self, bucket: &str, values: &[f64]) -> Result<()> {
        if values.len() != self.n_samples {
            return Err(BucketError::DimensionMismatch {
                expected: self.n_samples,
                actual: values.len(),
            });
        }

        let idx = match self.index.get(bucket) {
            Some(&idx) => idx,
            None => {
                let idx = self.buckets.len();
                self.buckets.push(bucket.to_string());
                self.index.insert(bucket.to_string(), idx);
                self.values.push(vec![0.0; self.n_samples]);
                idx
            }
        };

        for (acc, v) in self.values[idx].iter_mut().zip(values) {
            *acc += v;
        }
        Ok(())
    }

    /// Summed vector for a bucket.
    pub fn get(&self, bucket: &str) -> Option<&[f64]> {
        self.index.get(bucket).map(|&i| self.values[i].as_slice())
    }

    /// Bucket names in first-touched order.
    #[inline]
    pub fn buckets(&self) -> &[String] {
        &self.buckets
    }

    /// Number of buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no bucket has received a value yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of samples per vector.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Per-sample totals across all buckets.
    pub fn column_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_samples];
        for row in &self.values {
            for (t, v) in totals.iter_mut().zip(row) {
                *t += v;
            }
        }
        totals
    }

    /// Sum over every bucket and sample.
    pub fn grand_total(&self) -> f64 {
        self.column_totals().iter().sum()
    }

    /// Convert into a dense table with the given sample ids as columns.
    pub fn into_table(self, sample_ids: &[String]) -> Result<BucketTable> {
        let mut data = DMatrix::zeros(self.buckets.len(), self.n_samples);
        for (i, row) in self.values.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                data[(i, j)] = v;
            }
        }
        BucketTable::new(data, self.buckets, sample_ids.to_vec())
    }
}

/// A dense bucket × sample table with named rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTable {
    /// Values (buckets × samples).
    data: DMatrix<f64>,
    /// Bucket names (row index).
    buckets: Vec<String>,
    /// Sample ids (column names).
    samples: Vec<String>,
}

impl BucketTable {
    /// Create a table from a matrix and its row and column names.
    pub fn new(data: DMatrix<f64>, buckets: Vec<String>, samples: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != buckets.len() {
            return Err(BucketError::DimensionMismatch {
                expected: nrows,
                actual: buckets.len(),
            });
        }
        if ncols != samples.len() {
            return Err(BucketError::DimensionMismatch {
                expected: ncols,
                actual: samples.len(),
            });
        }
        Ok(Self {
            data,
            buckets,
            samples,
        })
    }

    /// Get the value at (bucket, sample).
    #[inline]
    pub fn get(&self, bucket: usize, sample: usize) -> f64 {
        self.data[(bucket, sample)]
    }

    /// Get a value by bucket name and sample id.
    pub fn value(&self, bucket: &str, sample: &str) -> Option<f64> {
        let i = self.bucket_index(bucket)?;
        let j = self.sample_index(sample)?;
        Some(self.data[(i, j)])
    }

    /// Row position of a bucket.
    pub fn bucket_index(&self, bucket: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b == bucket)
    }

    /// Column position of a sample.
    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.samples.iter().position(|s| s == sample)
    }

    /// Number of buckets (rows).
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Bucket names.
    #[inline]
    pub fn bucket_ids(&self) -> &[String] {
        &self.buckets
    }

    /// Sample ids.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.samples
    }

    /// Get reference to the underlying matrix.
    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Get a row (bucket) as a vector.
    pub fn row(&self, bucket: usize) -> Vec<f64> {
        self.data.row(bucket).iter().cloned().collect()
    }

    /// Get a column (sample) as a vector.
    pub fn col(&self, sample: usize) -> Vec<f64> {
        self.data.column(sample).iter().cloned().collect()
    }

    /// Per-sample column sums.
    pub fn col_sums(&self) -> Vec<f64> {
        (0..self.n_samples())
            .map(|j| self.data.column(j).iter().sum())
            .collect()
    }

    /// Per-bucket row sums.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_buckets())
            .map(|i| self.data.row(i).iter().sum())
            .collect()
    }

    /// Round every value to `decimals` decimal places. NaN stays NaN.
    ///
    /// Requests beyond [`MAX_DECIMALS`] are clamped to it.
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
        Self {
            data: self.data.map(|v| (v * factor).round() / factor),
            buckets: self.buckets.clone(),
            samples: self.samples.clone(),
        }
    }

    /// Write the table as CSV: bucket names as the row index, samples as columns.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, index_header: &str) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file, index_header)
    }

    /// Write the table as CSV to any writer.
    pub fn write_to<W: Write>(&self, writer: W, index_header: &str) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.n_samples() + 1);
        header.push(index_header.to_string());
        header.extend(self.samples.iter().cloned());
        writer.write_record(&header)?;

        for (i, bucket) in self.buckets.iter().enumerate() {
            let mut row = Vec::with_capacity(self.n_samples() + 1);
            row.push(bucket.clone());
            row.extend((0..self.n_samples()).map(|j| format_value(self.data[(i, j)])));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write per-bucket totals summed over all samples.
    pub fn write_row_totals_csv<P: AsRef<Path>>(
        &self,
        path: P,
        index_header: &str,
        value_header: &str,
    ) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([index_header, value_header])?;
        for (bucket, total) in self.buckets.iter().zip(self.row_sums()) {
            writer.write_record([bucket.as_str(), format_value(total).as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Shortest round-trip formatting, with NaN written literally.
fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{}", v)
    }
}
