//! Figure configuration and execution.

mod config;
mod runner;

pub use config::{
    BucketSpec, ClassifyConfig, ColorGroups, CsvValues, FigureConfig, InputOptions, NamedColor,
    OutputConfig,
};
pub use runner::{FigureOutput, Pipeline};
