//! Recoverable data-quality findings.
//!
//! These never abort a run. Every warning is returned to the caller and
//! logged through `tracing` at the point it is raised.

use std::fmt;

/// A data-quality condition detected while building a figure table.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A sample's normalization denominator was zero; its cells are NaN.
    ZeroDenominator { sample: String },
    /// A normalized sample column did not sum to 1.
    ClosureViolation { sample: String, total: f64 },
    /// A bucket found in the data is not part of the canonical bucket order.
    UnknownBucket { bucket: String },
    /// A label matched no rule and was routed to a catch-all bucket.
    UnmatchedLabel {
        label: String,
        bucket: String,
        occurrences: usize,
    },
    /// A label matched no rule and the fallback discards it.
    DiscardedLabel { label: String, occurrences: usize },
    /// A bucket's color group has no configured color.
    UnknownColorGroup { bucket: String, group: String },
}

impl Warning {
    /// Log this warning through `tracing`.
    pub fn emit(&self) {
        tracing::warn!("{}", self);
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ZeroDenominator { sample } => write!(
                f,
                "sample '{}' has a zero normalization denominator, values left as NaN",
                sample
            ),
            Warning::ClosureViolation { sample, total } => write!(
                f,
                "total relative abundance for sample '{}' is {:.6}, expected 1",
                sample, total
            ),
            Warning::UnknownBucket { bucket } => write!(
                f,
                "bucket '{}' is not in the configured bucket order, appended at the end",
                bucket
            ),
            Warning::UnmatchedLabel {
                label,
                bucket,
                occurrences,
            } => write!(
                f,
                "label '{}' matched no rule and was counted as '{}' ({} occurrences)",
                label, bucket, occurrences
            ),
            Warning::DiscardedLabel { label, occurrences } => write!(
                f,
                "label '{}' matched no rule and was discarded ({} occurrences)",
                label, occurrences
            ),
            Warning::UnknownColorGroup { bucket, group } => write!(
                f,
                "color group '{}' of bucket '{}' has no configured color",
                group, bucket
            ),
        }
    }
}
