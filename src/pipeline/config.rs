//! Serializable figure configuration.

use crate::classify::{Fallback, Membership, RuleSpec};
use crate::data::{NumericPolicy, SampleSpec, MAX_DECIMALS};
use crate::error::{BucketError, Result};
use crate::filter::RowFilter;
use crate::normalize::NormalizationSpec;
use crate::render::ChartSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything needed to turn one abundance table into one figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Name of the figure.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How the input table is read.
    #[serde(default)]
    pub input: InputOptions,
    /// Sample columns, in canonical order.
    pub samples: Vec<SampleSpec>,
    /// Row filters applied before classification.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<RowFilter>,
    /// Classification rules.
    pub classify: ClassifyConfig,
    /// Per-sample normalization.
    #[serde(default)]
    pub normalization: NormalizationSpec,
    /// Canonical buckets, in output order.
    pub buckets: Vec<BucketSpec>,
    /// Color groups for charts that color buckets by group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_groups: Option<ColorGroups>,
    /// Output files.
    pub output: OutputConfig,
}

/// Input reading options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputOptions {
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Handling of missing or non-numeric sample cells.
    #[serde(default)]
    pub numeric_policy: NumericPolicy,
    /// File read when no input path is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_file: Option<PathBuf>,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            numeric_policy: NumericPolicy::default(),
            default_file: None,
        }
    }
}

impl InputOptions {
    /// The delimiter as a single byte.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                BucketError::InvalidParameter(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }
}

/// Label columns and rules used to assign records to buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Label columns, in the order predicates see them.
    pub columns: Vec<String>,
    /// Exclusive or multi-membership classification.
    #[serde(default)]
    pub membership: Membership,
    /// Rules in priority order.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Destination of records that match no rule.
    #[serde(default)]
    pub fallback: Fallback,
}

/// A canonical bucket with its presentation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    /// `#rrggbb` fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Legend text, when it differs from the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Static color group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl BucketSpec {
    /// A bucket with a fill color.
    pub fn colored(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Some(color.to_string()),
            label: None,
            group: None,
        }
    }

    /// A bucket without its own color.
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            color: None,
            label: None,
            group: None,
        }
    }

    /// Set the legend label.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Set the static color group.
    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

/// Colors by group instead of by bucket.
///
/// A bucket's group is its static `group`, or else the value of `column` on
/// the first filtered record classified into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroups {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Group used when the looked-up cell is missing.
    #[serde(default = "default_unknown_group")]
    pub unknown: String,
    /// Group colors, in legend order.
    pub colors: Vec<NamedColor>,
}

/// A group name with its `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub color: String,
}

impl NamedColor {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Which values the main CSV holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvValues {
    /// Bucket totals before normalization.
    Raw,
    /// Normalized values.
    #[default]
    Normalized,
}

/// Output files, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Bucket × sample table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    #[serde(default)]
    pub csv_values: CsvValues,
    /// Per-bucket raw totals summed over all samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals_csv: Option<PathBuf>,
    /// Decimal places of the main CSV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    /// Header of the bucket column.
    #[serde(default = "default_index_header")]
    pub index_header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: None,
            csv_values: CsvValues::default(),
            totals_csv: None,
            round: None,
            index_header: default_index_header(),
            chart: None,
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_unknown_group() -> String {
    "Unknown".to_string()
}

fn default_index_header() -> String {
    "bucket".to_string()
}

impl FigureConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings serde cannot express as types.
    pub fn validate(&self) -> Result<()> {
        match self.output.round {
            Some(decimals) if decimals > MAX_DECIMALS => Err(BucketError::InvalidParameter(
                format!(
                    "output.round must be at most {} decimals, got {}",
                    MAX_DECIMALS, decimals
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(BucketError::from)
    }

    /// Load a YAML config file.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Canonical bucket order.
    pub fn bucket_order(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.name.as_str()).collect()
    }

    /// Every input column the figure reads, sample columns first.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.samples.iter().map(|s| s.column()).collect();
        columns.extend(self.classify.columns.iter().map(String::as_str));
        columns.extend(self.filters.iter().map(RowFilter::column));
        if let NormalizationSpec::RatioToReference { reference } = &self.normalization {
            columns.extend(reference.iter().map(RowFilter::column));
        }
        if let Some(column) = self.color_groups.as_ref().and_then(|g| g.column.as_deref()) {
            columns.push(column);
        }
        let mut seen = std::collections::HashSet::new();
        columns.retain(|c| seen.insert(*c));
        columns
    }
}
