//! Ordered sample axis shared by every output table.

use crate::error::{BucketError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One sample on the axis: the output id and the input column it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleSpec {
    /// Output id and input column are the same header.
    Same(String),
    /// Output id differs from the input column header.
    Renamed { id: String, column: String },
}

impl SampleSpec {
    /// Output column name.
    pub fn id(&self) -> &str {
        match self {
            SampleSpec::Same(id) => id,
            SampleSpec::Renamed { id, .. } => id,
        }
    }

    /// Input column header.
    pub fn column(&self) -> &str {
        match self {
            SampleSpec::Same(id) => id,
            SampleSpec::Renamed { column, .. } => column,
        }
    }
}

/// The fixed, ordered list of samples forming output columns.
///
/// Output tables use exactly these ids, in this order. Charts draw the
/// samples in [`SampleAxis::plot_order`], the reverse of the axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAxis {
    ids: Vec<String>,
    columns: Vec<String>,
}

impl SampleAxis {
    /// Create an axis where each sample id is also its input column.
    pub fn new<S: AsRef<str>>(ids: &[S]) -> Result<Self> {
        let specs: Vec<SampleSpec> = ids
            .iter()
            .map(|s| SampleSpec::Same(s.as_ref().to_string()))
            .collect();
        Self::from_specs(&specs)
    }

    /// Create an axis from sample specs, rejecting duplicate ids.
    pub fn from_specs(specs: &[SampleSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(BucketError::EmptyData(
                "Sample axis must contain at least one sample".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert(spec.id()) {
                return Err(BucketError::DuplicateSample(spec.id().to_string()));
            }
        }

        Ok(Self {
            ids: specs.iter().map(|s| s.id().to_string()).collect(),
            columns: specs.iter().map(|s| s.column().to_string()).collect(),
        })
    }

    /// Output sample ids in axis order.
    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Input column headers in axis order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false for a constructed axis.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of a sample id on the axis.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|s| s == id)
    }

    /// Sample ids in chart order (reversed axis).
    pub fn plot_order(&self) -> Vec<&str> {
        self.ids.iter().rev().map(String::as_str).collect()
    }

    /// Specs describing this axis, for serialization.
    pub fn specs(&self) -> Vec<SampleSpec> {
        self.ids
            .iter()
            .zip(&self.columns)
            .map(|(id, column)| {
                if id == column {
                    SampleSpec::Same(id.clone())
                } else {
                    SampleSpec::Renamed {
                        id: id.clone(),
                        column: column.clone(),
                    }
                }
            })
            .collect()
    }
}
