//! Pipeline runner: filter, classify, aggregate, align and normalize.

use super::config::{ColorGroups, CsvValues, FigureConfig, OutputConfig};
use crate::classify::{build_rules, classify_and_aggregate, RuleSet};
use crate::data::{AbundanceTable, BucketTable, SampleAxis};
use crate::error::{BucketError, Result};
use crate::filter::filter_rows;
use crate::normalize::{normalize, reference_totals, Normalization, NormalizationSpec, NormalizedTable};
use crate::order::order_and_align;
use crate::render::{parse_hex, render_bubble, render_stacked_bar, BucketStyle, ChartSpec, FALLBACK_GREY};
use crate::warning::Warning;
use plotters::style::RGBColor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Executes one [`FigureConfig`] against an abundance table.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: FigureConfig,
}

/// Everything a run produces, before anything is written.
#[derive(Debug, Clone)]
pub struct FigureOutput {
    /// Figure name.
    pub name: String,
    /// Number of records left after row filtering.
    pub n_records: usize,
    /// Bucket totals in canonical bucket and sample order.
    pub raw: BucketTable,
    /// Normalized values, same layout as `raw`.
    pub normalized: NormalizedTable,
    /// Style of every row of `raw`, in row order.
    pub styles: Vec<BucketStyle>,
    /// Color legend entries when buckets are colored by group.
    pub groups: Vec<(String, RGBColor)>,
    /// Every warning raised during the run, in order.
    pub warnings: Vec<Warning>,
    output: OutputConfig,
}

impl Pipeline {
    /// Create from a config.
    pub fn from_config(config: &FigureConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// The config this pipeline runs.
    pub fn config(&self) -> &FigureConfig {
        &self.config
    }

    /// Load the input table with the configured delimiter.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<AbundanceTable> {
        AbundanceTable::from_path(path, self.config.input.delimiter_byte()?)
    }

    /// Run the figure against `table`.
    ///
    /// Every referenced column is checked before any work starts, so a
    /// missing column fails the run without partial results.
    pub fn run(&self, table: &AbundanceTable) -> Result<FigureOutput> {
        let cfg = &self.config;
        let policy = cfg.input.numeric_policy;
        cfg.validate()?;
        let axis = SampleAxis::from_specs(&cfg.samples)?;
        table.column_indices(&cfg.required_columns())?;

        let rules = RuleSet::new(build_rules(&cfg.classify.rules)?)
            .with_membership(cfg.classify.membership.clone())
            .with_fallback(cfg.classify.fallback.clone());
        let color_groups = cfg
            .color_groups
            .as_ref()
            .map(parse_group_colors)
            .transpose()?;

        let selected = filter_rows(table, &cfg.filters)?;
        tracing::info!(
            "{}: {} of {} records pass the row filters",
            cfg.name,
            selected.n_records(),
            table.n_records()
        );

        let records = selected.records(&axis, &cfg.classify.columns, policy)?;
        let aggregation = classify_and_aggregate(&records, &axis, &rules)?;
        let mut warnings = aggregation.warnings;
        let totals = aggregation.totals.into_table(axis.ids())?;

        let aligned = order_and_align(&totals, &cfg.bucket_order(), axis.ids())?;
        warnings.extend(aligned.warnings);
        let raw = aligned.table;

        let mode = match &cfg.normalization {
            NormalizationSpec::ShareOfTotal => Normalization::ShareOfTotal,
            NormalizationSpec::RatioToReference { reference } => Normalization::RatioToReference(
                reference_totals(table, &axis, reference, policy)?,
            ),
            NormalizationSpec::Raw => Normalization::Raw,
        };
        let normalized = normalize(&raw, &axis, &mode)?;
        warnings.extend(normalized.warnings.iter().cloned());
        tracing::debug!("Normalized by {}: {:?}", normalized.method, normalized.denominators);

        let (styles, groups, style_warnings) = self.resolve_styles(&raw, &selected, color_groups)?;
        warnings.extend(style_warnings);

        Ok(FigureOutput {
            name: cfg.name.clone(),
            n_records: selected.n_records(),
            raw,
            normalized,
            styles,
            groups,
            warnings,
            output: cfg.output.clone(),
        })
    }

    /// Colors and legend labels of every row of `raw`.
    fn resolve_styles(
        &self,
        raw: &BucketTable,
        selected: &AbundanceTable,
        color_groups: Option<GroupColors>,
    ) -> Result<(Vec<BucketStyle>, Vec<(String, RGBColor)>, Vec<Warning>)> {
        let specs: HashMap<&str, _> = self
            .config
            .buckets
            .iter()
            .map(|b| (b.name.as_str(), b))
            .collect();

        let mut styles = Vec::with_capacity(raw.n_buckets());
        let mut warnings = Vec::new();
        let mut legend = color_groups
            .as_ref()
            .map(|g| g.legend.clone())
            .unwrap_or_default();

        for bucket in raw.bucket_ids() {
            let spec = specs.get(bucket.as_str());
            let label = spec
                .and_then(|s| s.label.clone())
                .unwrap_or_else(|| bucket.clone());

            let color = match &color_groups {
                None => match spec.and_then(|s| s.color.as_deref()) {
                    Some(hex) => parse_hex(hex)?,
                    None => FALLBACK_GREY,
                },
                Some(groups) => {
                    let group = match spec.and_then(|s| s.group.clone()) {
                        Some(group) => Some(group),
                        None => self.lookup_group(bucket, selected, groups)?,
                    };
                    match group {
                        None => FALLBACK_GREY,
                        Some(group) => match groups.colors.get(&group) {
                            Some(&color) => color,
                            None => {
                                let warning = Warning::UnknownColorGroup {
                                    bucket: bucket.clone(),
                                    group: group.clone(),
                                };
                                warning.emit();
                                warnings.push(warning);
                                if !legend.iter().any(|(name, _)| name == &group) {
                                    legend.push((group, FALLBACK_GREY));
                                }
                                FALLBACK_GREY
                            }
                        },
                    }
                }
            };

            styles.push(BucketStyle {
                name: bucket.clone(),
                label,
                color,
            });
        }
        Ok((styles, legend, warnings))
    }

    /// Group of `bucket` read from the first filtered record whose first
    /// label is the bucket name. `None` when no record carries the bucket.
    fn lookup_group(
        &self,
        bucket: &str,
        selected: &AbundanceTable,
        groups: &GroupColors,
    ) -> Result<Option<String>> {
        let (Some(column), Some(label_column)) =
            (groups.column.as_deref(), self.config.classify.columns.first())
        else {
            return Ok(None);
        };
        let group_col = selected.column_index(column)?;
        let label_col = selected.column_index(label_column)?;
        Ok((0..selected.n_records())
            .find(|&row| selected.text(row, label_col) == Some(bucket))
            .map(|row| {
                selected
                    .text(row, group_col)
                    .map_or_else(|| groups.unknown.clone(), str::to_string)
            }))
    }
}

struct GroupColors {
    column: Option<String>,
    unknown: String,
    colors: HashMap<String, RGBColor>,
    legend: Vec<(String, RGBColor)>,
}

fn parse_group_colors(groups: &ColorGroups) -> Result<GroupColors> {
    let legend = groups
        .colors
        .iter()
        .map(|c| Ok((c.name.clone(), parse_hex(&c.color)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(GroupColors {
        column: groups.column.clone(),
        unknown: groups.unknown.clone(),
        colors: legend.iter().cloned().collect(),
        legend,
    })
}

impl FigureOutput {
    /// The table the main CSV holds, rounded if configured.
    pub fn csv_table(&self) -> BucketTable {
        let table = match self.output.csv_values {
            CsvValues::Raw => &self.raw,
            CsvValues::Normalized => &self.normalized.table,
        };
        match self.output.round {
            Some(decimals) => table.rounded(decimals),
            None => table.clone(),
        }
    }

    /// Write the configured CSV files and chart under `dir`.
    ///
    /// Returns the written paths in the order they were written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if let Some(csv) = &self.output.csv {
            let path = dir.join(csv);
            self.csv_table()
                .write_csv(&path, &self.output.index_header)?;
            written.push(path);
        }

        if let Some(totals) = &self.output.totals_csv {
            let path = dir.join(totals);
            self.raw
                .write_row_totals_csv(&path, &self.output.index_header, "Total Abundance")?;
            written.push(path);
        }

        if let Some(chart) = &self.output.chart {
            let path = dir.join(chart.path());
            match chart {
                ChartSpec::StackedBar { options, .. } => {
                    render_stacked_bar(&path, &self.normalized.table, &self.styles, options)?
                }
                ChartSpec::Bubble { options, .. } => render_bubble(
                    &path,
                    &self.normalized.table,
                    &self.styles,
                    &self.groups,
                    options,
                )?,
            }
            written.push(path);
        }

        if written.is_empty() {
            return Err(BucketError::InvalidParameter(format!(
                "figure '{}' has no outputs configured",
                self.name
            )));
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Fallback, RuleSpec};
    use crate::data::SampleSpec;
    use crate::filter::RowFilter;
    use crate::pipeline::config::{BucketSpec, ClassifyConfig, InputOptions, NamedColor};
    use crate::render::BubbleChart;
    use approx::assert_relative_eq;

    const TABLE: &str = "\
annotation,cluster,subgroup,X,Y
RpS3,,,60,40
RpS3,,,40,0
McrA,1B,Houtuarculales,25,8
McrA,1B,,25,2
McrA,2A,Mystery,10,NA
RpL2,,,1000,1000
";

    fn clusters() -> FigureConfig {
        FigureConfig {
            name: "clusters".into(),
            description: None,
            input: InputOptions::default(),
            samples: vec![SampleSpec::Same("X".into()), SampleSpec::Same("Y".into())],
            filters: vec![RowFilter::NotMissing {
                column: "cluster".into(),
            }],
            classify: ClassifyConfig {
                columns: vec!["cluster".into()],
                membership: Default::default(),
                rules: Vec::new(),
                fallback: Fallback::RawLabel,
            },
            normalization: NormalizationSpec::RatioToReference {
                reference: vec![RowFilter::Equals {
                    column: "annotation".into(),
                    value: "RpS3".into(),
                }],
            },
            buckets: vec![BucketSpec::plain("1B"), BucketSpec::plain("1C")],
            color_groups: Some(ColorGroups {
                column: Some("subgroup".into()),
                unknown: "Unknown".into(),
                colors: vec![NamedColor::new("Houtuarculales", "#824fcb")],
            }),
            output: OutputConfig {
                csv: Some("clusters.csv".into()),
                chart: Some(ChartSpec::Bubble {
                    path: "clusters.svg".into(),
                    options: BubbleChart {
                        title: "Clusters".into(),
                        scale: 5000.0,
                        size_legend: vec![0.1],
                        size_legend_title: "Normalized abundance".into(),
                        color_legend_title: "Phylogenetic group".into(),
                        size: (900, 600),
                    },
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_ratio_to_reference_run() {
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let pipeline = Pipeline::from_config(&clusters());
        assert_eq!(pipeline.config().name, "clusters");
        let out = pipeline.run(&table).unwrap();

        assert_eq!(out.n_records, 3);
        assert_eq!(out.raw.bucket_ids(), &["1B", "1C", "2A"]);
        assert_eq!(out.raw.row(0), vec![50.0, 10.0]);
        assert_eq!(out.raw.row(1), vec![0.0, 0.0]);
        assert_eq!(out.raw.row(2), vec![10.0, 0.0]);
        assert_relative_eq!(out.normalized.table.get(0, 0), 0.5);
        assert_relative_eq!(out.normalized.table.get(0, 1), 0.25);
        assert_relative_eq!(out.normalized.table.get(2, 0), 0.1);
        assert_eq!(out.normalized.denominators, vec![100.0, 40.0]);
        assert!(out.warnings.contains(&Warning::UnknownBucket {
            bucket: "2A".into()
        }));
    }

    #[test]
    fn test_groups_from_first_record() {
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let out = Pipeline::from_config(&clusters()).run(&table).unwrap();

        let color = |i: usize| {
            let c = out.styles[i].color;
            (c.0, c.1, c.2)
        };
        assert_eq!(color(0), (0x82, 0x4f, 0xcb));
        assert_eq!(color(1), (0xbe, 0xbe, 0xbe));
        assert_eq!(color(2), (0xbe, 0xbe, 0xbe));
        assert!(out.warnings.contains(&Warning::UnknownColorGroup {
            bucket: "2A".into(),
            group: "Mystery".into()
        }));
        let names: Vec<&str> = out.groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Houtuarculales", "Mystery"]);
    }

    #[test]
    fn test_missing_column_fails_before_output() {
        let mut config = clusters();
        config.classify.columns = vec!["Assigned_ID".into()];
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let result = Pipeline::from_config(&config).run(&table);
        assert!(matches!(result, Err(BucketError::MissingColumn(ref c)) if c == "Assigned_ID"));
    }

    #[test]
    fn test_write_outputs() {
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let out = Pipeline::from_config(&clusters()).run(&table).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written = out.write(dir.path()).unwrap();

        assert_eq!(written.len(), 2);
        let csv = std::fs::read_to_string(dir.path().join("clusters.csv")).unwrap();
        assert_eq!(csv, "bucket,X,Y\n1B,0.5,0.25\n1C,0,0\n2A,0.1,0\n");
        assert!(dir.path().join("clusters.svg").exists());
    }

    #[test]
    fn test_share_run_with_rules() {
        let config = FigureConfig {
            name: "genes".into(),
            samples: vec![SampleSpec::Same("X".into()), SampleSpec::Same("Y".into())],
            filters: Vec::new(),
            classify: ClassifyConfig {
                columns: vec!["annotation".into()],
                membership: Default::default(),
                rules: vec![RuleSpec::exact("RpS3"), RuleSpec::exact("McrA")],
                fallback: Fallback::default(),
            },
            normalization: NormalizationSpec::ShareOfTotal,
            buckets: vec![
                BucketSpec::colored("RpS3", "#fe0000"),
                BucketSpec::colored("McrA", "#00ffff").with_label("Methyl-coenzyme M reductase"),
                BucketSpec::colored("Others", "#bebebe"),
            ],
            color_groups: None,
            description: None,
            input: InputOptions::default(),
            output: OutputConfig {
                csv: Some("genes.csv".into()),
                ..Default::default()
            },
        };
        let table = AbundanceTable::from_reader(TABLE.as_bytes(), b',').unwrap();
        let out = Pipeline::from_config(&config).run(&table).unwrap();

        assert_eq!(out.raw.row(2), vec![1000.0, 1000.0]);
        assert_relative_eq!(out.normalized.table.get(0, 0), 100.0 / 1160.0);
        assert_eq!(out.styles[1].label, "Methyl-coenzyme M reductase");
        for total in out.normalized.table.col_sums() {
            assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        }
        assert_eq!(
            out.warnings,
            vec![Warning::UnmatchedLabel {
                label: "RpL2".into(),
                bucket: "Others".into(),
                occurrences: 1
            }]
        );
    }
}
