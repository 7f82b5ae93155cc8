//! Taxon and Function Bucket Aggregation Library
//!
//! This library turns annotated abundance tables (one row per sequence or
//! OTU, one numeric column per sample) into per-sample bucket tables ready
//! for plotting: records are classified into named buckets, summed per
//! sample, normalized and reindexed to a canonical order.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (AbundanceTable, SampleAxis, BucketTable)
//! - **filter**: Row filters applied before classification
//! - **classify**: Predicates, ordered rules and the classifier-aggregator
//! - **normalize**: Share-of-total and ratio-to-reference normalization
//! - **order**: Canonical row/column reindexing with zero fill
//! - **render**: SVG stacked bar and bubble charts
//! - **profile**: Input table profiling
//! - **pipeline**: Figure configuration and execution
//! - **presets**: Built-in figure configurations
//!
//! # Example
//!
//! ```no_run
//! use taxon_buckets::prelude::*;
//!
//! let config = presets::figure4();
//! let pipeline = Pipeline::from_config(&config);
//! let table = pipeline.load("master_table.csv").unwrap();
//!
//! let figure = pipeline.run(&table).unwrap();
//! for warning in &figure.warnings {
//!     println!("{}", warning);
//! }
//! figure.write(std::path::Path::new("out")).unwrap();
//! ```

pub mod classify;
pub mod data;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod presets;
pub mod profile;
pub mod render;
pub mod warning;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::classify::{
        build_rules, classify_and_aggregate, Aggregation, AnyOf, Contains, ExactLabel, Fallback,
        MatchKind, MatchRule, Membership, Predicate, RuleSet, RuleSpec, Tokenizer, WholeWord,
        OTHERS,
    };
    pub use crate::data::{
        AbundanceTable, BucketTable, BucketTotals, NumericPolicy, Record, SampleAxis, SampleSpec,
    };
    pub use crate::error::{BucketError, Result};
    pub use crate::filter::{filter_rows, select_rows, RowFilter};
    pub use crate::normalize::{
        check_closure, norm_reference, norm_share, normalize, reference_totals, Normalization,
        NormalizationSpec, NormalizedTable, CLOSURE_TOLERANCE,
    };
    pub use crate::order::{order_and_align, Alignment};
    pub use crate::pipeline::{
        BucketSpec, ClassifyConfig, ColorGroups, CsvValues, FigureConfig, FigureOutput,
        InputOptions, NamedColor, OutputConfig, Pipeline,
    };
    pub use crate::presets;
    pub use crate::profile::{profile_table, TableProfile};
    pub use crate::render::{
        render_bubble, render_stacked_bar, BarChart, BubbleChart, BucketStyle, ChartSpec,
    };
    pub use crate::warning::Warning;
}
