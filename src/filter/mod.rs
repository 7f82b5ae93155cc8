//! Filtering primitives for abundance tables.

pub mod rows;

pub use rows::{filter_rows, select_rows, RowFilter};
