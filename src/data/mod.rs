//! Data structures for bucketed abundance tables.

mod abundance_table;
mod bucket_table;
mod sample_axis;

pub use abundance_table::{is_missing, AbundanceTable, NumericPolicy, Record};
pub use bucket_table::{BucketTable, BucketTotals, MAX_DECIMALS};
pub use sample_axis::{SampleAxis, SampleSpec};
