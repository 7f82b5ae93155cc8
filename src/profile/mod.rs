//! Profiling of input tables before classification.

mod table;

pub use table::{profile_table, TableProfile};
