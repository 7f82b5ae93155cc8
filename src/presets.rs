//! Built-in figure configurations for the Lake Cadagno 2024 sediment data.
//!
//! Each preset reproduces one manuscript figure: the same sample axis,
//! bucket order, colors and normalization. Export one with
//! [`FigureConfig::to_yaml`] to use it as a starting point for a new figure.

use crate::classify::{Fallback, Membership, RuleSpec, Tokenizer};
use crate::data::SampleSpec;
use crate::filter::RowFilter;
use crate::normalize::NormalizationSpec;
use crate::pipeline::{
    BucketSpec, ClassifyConfig, ColorGroups, CsvValues, FigureConfig, InputOptions, NamedColor,
    OutputConfig,
};
use crate::render::{BarChart, BubbleChart, ChartSpec};

/// Sediment depths, top to bottom.
pub const DEPTHS: [&str; 13] = [
    "3_cm", "40_cm", "153_cm", "187_cm", "213_cm", "233_cm", "283_cm", "382_cm", "532_cm",
    "566_cm", "582_cm", "693_cm", "738_cm",
];

/// Metagenomic master table read by the metagenomic presets.
pub const MASTER_TABLE: &str = "MASTER_TABLE_METAGENOMIC_DATA_MANUSCRIPT_LAKE_CADAGNO_2024_PFTGLC.csv";

/// 16S OTU table read by [`otu97`].
pub const OTU_TABLE: &str = "REAL0.97__complete_otu_table_qiime_Cara_Classification_97_identity.csv";

const ANNOTATION: &str = "Functional_annotation_short_blast_or_tree_placement";

/// Names of all presets, in manuscript order.
pub const NAMES: [&str; 5] = ["figure1b", "figure3", "figure4", "figure5", "otu97"];

/// All presets, in manuscript order.
pub fn all() -> Vec<FigureConfig> {
    vec![figure1b(), figure3(), figure4(), figure5(), otu97()]
}

/// Look up a preset by name.
pub fn by_name(name: &str) -> Option<FigureConfig> {
    match name {
        "figure1b" => Some(figure1b()),
        "figure3" => Some(figure3()),
        "figure4" => Some(figure4()),
        "figure5" => Some(figure5()),
        "otu97" => Some(otu97()),
        _ => None,
    }
}

fn depth_axis() -> Vec<SampleSpec> {
    DEPTHS.iter().map(|d| SampleSpec::Same(d.to_string())).collect()
}

fn master_input() -> InputOptions {
    InputOptions {
        default_file: Some(MASTER_TABLE.into()),
        ..Default::default()
    }
}

fn rps3_reference() -> NormalizationSpec {
    NormalizationSpec::RatioToReference {
        reference: vec![RowFilter::Equals {
            column: ANNOTATION.to_string(),
            value: "RpS3".to_string(),
        }],
    }
}

/// Figure 1B: taxonomic composition of RpS3 sequences by depth.
pub fn figure1b() -> FigureConfig {
    const GROUPS: [(&str, &str); 19] = [
        ("Acidobacteria", "#80fed4"),
        ("Actinobacteria", "#238b21"),
        ("Candidatus Aminicenantes", "#528a8b"),
        ("Deltaproteobacteria", "#fe0000"),
        ("Other Proteobacteria", "#fe69b4"),
        ("Anaerolineae", "#8b0100"),
        ("Dehalococcoidia", "#bfff3d"),
        ("Other Chloroflexi", "#2f4f4f"),
        ("Candidatus Atribacteria", "#473c8b"),
        ("Bacteroidetes", "#00ffff"),
        ("Candidatus Bipolaricaulota", "#feff00"),
        ("Firmicutes", "#ffebcd"),
        ("Nitrospirae", "#000000"),
        ("Planctomycetes", "#ff8c00"),
        ("Candidatus Aenigmarchaeota", "#e5ce15"),
        ("Euryarchaeota", "#ba2452"),
        ("Candidatus Woesearchaeota", "#9400d3"),
        ("Candidatus Bathyarchaeia", "#181a6f"),
        ("Unclassified archaea", "#ffc0cb"),
    ];
    const LABEL: &str = "BLAST_taxonomic_annotation";

    let mut buckets: Vec<BucketSpec> = GROUPS
        .iter()
        .map(|(name, color)| BucketSpec::colored(name, color))
        .collect();
    buckets.push(BucketSpec::colored("Others", "#bebebe"));

    FigureConfig {
        name: "figure1b".into(),
        description: Some("Relative abundance of RpS3 sequences by taxonomic group and depth".into()),
        input: master_input(),
        samples: depth_axis(),
        filters: vec![
            RowFilter::Contains {
                column: ANNOTATION.into(),
                pattern: "rps3".into(),
            },
            RowFilter::NotMissing {
                column: LABEL.into(),
            },
        ],
        classify: ClassifyConfig {
            columns: vec![LABEL.into()],
            membership: Membership::Exclusive,
            rules: GROUPS.iter().map(|(name, _)| RuleSpec::exact(name)).collect(),
            fallback: Fallback::default(),
        },
        normalization: NormalizationSpec::ShareOfTotal,
        buckets,
        color_groups: None,
        output: OutputConfig {
            csv: Some("Figure_1_b_rps3_normalized_abundance_by_taxonomic_groups.csv".into()),
            csv_values: CsvValues::Normalized,
            index_header: LABEL.into(),
            chart: Some(ChartSpec::StackedBar {
                path: "Figure_1_b_rps3_normalized_abundance_by_taxonomic_groups.svg".into(),
                options: BarChart {
                    title: "Figure 1B (Main Manuscript)-Relative abundances of RpS3 protein sequences  with depth".into(),
                    x_label: "Relative Abundance".into(),
                    y_label: "Sample Depth (cm)".into(),
                    legend_title: "Taxonomic Groups".into(),
                    size: (1000, 700),
                },
            }),
            ..Default::default()
        },
    }
}

/// Figure 3: Candidatus Bathyarchaeia clusters per RpS3, colored by subgroup.
pub fn figure3() -> FigureConfig {
    const CLUSTERS: [&str; 24] = [
        "1B", "1C", "1D", "2A", "2B", "3A", "3B", "3C", "3D", "4A", "4B", "4D", "4E", "4F", "4G",
        "4H", "5A", "5B", "5C", "5D", "5E", "5F", "5G", "5H",
    ];
    const SUBGROUPS: [(&str, &str); 5] = [
        ("Wuzhiqiibiales (Subgroup 15 - Ca. Bathyarchaeota B23)", "#ab8cc6"),
        ("Xuanwarculales (Subgroup 17 - Ca. Bathyarchaeota RGB_16_48_13)", "#99d96a"),
        ("Houtuarculales (Subgroup 18 - Ca. Bathyarchaeota 13_38_9)", "#824fcb"),
        ("Baizomonadales (Subgroup 6 - Ca. Bathyarchaeota 13_46_16b)", "#3d59ae"),
        ("Baizomonadales (Subgroup 13 - Ca. Bathyarchaeota B26-1)", "#e5ce53"),
    ];
    const CLUSTER: &str = "Assigned_ID_Candidatus_Bathyarchaeia_cluster";

    FigureConfig {
        name: "figure3".into(),
        description: Some("Candidatus Bathyarchaeia clusters normalized to RpS3".into()),
        input: master_input(),
        samples: depth_axis(),
        filters: vec![RowFilter::NotMissing {
            column: CLUSTER.into(),
        }],
        classify: ClassifyConfig {
            columns: vec![CLUSTER.into()],
            membership: Membership::Exclusive,
            rules: Vec::new(),
            fallback: Fallback::RawLabel,
        },
        normalization: rps3_reference(),
        buckets: CLUSTERS.iter().map(|c| BucketSpec::plain(c)).collect(),
        color_groups: Some(ColorGroups {
            column: Some("Taxonomic_assignment_Zhou_Hou_GDBTk_Ca_Bathyarchaeia".into()),
            unknown: "Unknown".into(),
            colors: SUBGROUPS
                .iter()
                .map(|(name, color)| NamedColor::new(name, color))
                .collect(),
        }),
        output: OutputConfig {
            csv: Some("bathyarchaeia_cluster_summary_abundances.csv".into()),
            csv_values: CsvValues::Normalized,
            index_header: String::new(),
            chart: Some(ChartSpec::Bubble {
                path: "Figure_3_manuscript_Candidatus_Bathyarchaeia_sugroups.svg".into(),
                options: BubbleChart {
                    title: "Candidatus Bathyarchaeia subgroups".into(),
                    scale: 5000.0,
                    size_legend: vec![0.001, 0.01, 0.05, 0.1, 0.2, 0.43],
                    size_legend_title: "Normalized abundance".into(),
                    color_legend_title: "Phylogenetic group".into(),
                    size: (1200, 800),
                },
            }),
            ..Default::default()
        },
    }
}

/// Figure 4: COG categories and supercategories, multi-membership by letter.
pub fn figure4() -> FigureConfig {
    const CATEGORIES: [(&str, &str, &str); 10] = [
        ("E", "Amino acid transport and metabolism", "#dbc750"),
        ("G", "Carbohydrate transport and metabolism", "#807a38"),
        ("H", "Coenzyme transport and metabolism", "#346566"),
        ("V", "Defense mechanisms", "#ffcd4b"),
        ("C", "Energy production and conversion", "#a14c08"),
        ("P", "Inorganic ion transport and metabolism", "#2ca7bc"),
        ("I", "Lipid transport and metabolism", "#fd9e55"),
        ("F", "Nucleotide transport and metabolism", "#ff6f0c"),
        ("S", "Poorly characterized", "#98c979"),
        (
            "Q",
            "Secondary metabolites biosynthesis, transport and catabolism",
            "#228e44",
        ),
    ];
    const CELLULAR: &str = "CELLULAR PROCESSES AND SIGNALING (D,Y,T,M,N,Z,W,U,O)";
    const INFORMATION: &str = "INFORMATION STORAGE AND PROCESSING (J,A,K,L,B)";
    const COG: &str = "COG_category";

    let mut rules: Vec<RuleSpec> = CATEGORIES
        .iter()
        .map(|(letter, _, _)| RuleSpec::exact(letter))
        .collect();
    rules.push(RuleSpec::exact_any(
        CELLULAR,
        &["D", "Y", "T", "M", "N", "Z", "W", "U", "O"],
    ));
    rules.push(RuleSpec::exact_any(INFORMATION, &["J", "A", "K", "L", "B"]));

    let mut buckets: Vec<BucketSpec> = CATEGORIES
        .iter()
        .map(|(letter, name, color)| BucketSpec::colored(letter, color).with_label(name))
        .collect();
    buckets.push(BucketSpec::colored(CELLULAR, "#7fa69c"));
    buckets.push(BucketSpec::colored(INFORMATION, "#76c9de"));

    FigureConfig {
        name: "figure4".into(),
        description: Some("Share of COG categories and supercategories by depth".into()),
        input: master_input(),
        samples: depth_axis(),
        filters: vec![
            RowFilter::NotMissing { column: COG.into() },
            RowFilter::NotEqual {
                column: COG.into(),
                value: "-".into(),
            },
        ],
        classify: ClassifyConfig {
            columns: vec![COG.into()],
            membership: Membership::Multi {
                tokens: Tokenizer::Chars,
            },
            rules,
            fallback: Fallback::Discard,
        },
        normalization: NormalizationSpec::ShareOfTotal,
        buckets,
        color_groups: None,
        output: OutputConfig {
            csv: Some("Figure_4_normalized_abundances_per_COG_category.csv".into()),
            csv_values: CsvValues::Normalized,
            totals_csv: Some("Figure_4_abundances_sum_per_sample_per_C0G_category.csv".into()),
            index_header: String::new(),
            chart: Some(ChartSpec::StackedBar {
                path: "Figure_4_main_manuscript_COG_categories.svg".into(),
                options: BarChart {
                    title: "Normalized Abundance of COG Categories and Supercategories by Sample"
                        .into(),
                    x_label: "Relative Abundance".into(),
                    y_label: "Sample Depth (cm)".into(),
                    legend_title: "COG Categories".into(),
                    size: (1400, 800),
                },
            }),
            ..Default::default()
        },
    }
}

/// Figure 5: marker genes per RpS3, colored by element cycle.
pub fn figure5() -> FigureConfig {
    const GENES: [(&str, &str); 20] = [
        ("AcsA", "Carbon"),
        ("CdhC", "Carbon"),
        ("RuBisCO_Type_I", "Carbon"),
        ("RuBisCO_Type_III", "Carbon"),
        ("McrA", "Carbon"),
        ("DsrA", "Sulfur"),
        ("DsrB", "Sulfur"),
        ("AprA", "Sulfur"),
        ("AprB", "Sulfur"),
        ("NarG", "Nitrogen"),
        ("NarH", "Nitrogen"),
        ("NifD", "Nitrogen"),
        ("NifH", "Nitrogen"),
        ("NifK", "Nitrogen"),
        ("NfrA", "Nitrogen"),
        ("NfrH", "Nitrogen"),
        ("NirD", "Nitrogen"),
        ("NorB", "Nitrogen"),
        ("NorC", "Nitrogen"),
        ("HAO", "Nitrogen"),
    ];

    FigureConfig {
        name: "figure5".into(),
        description: Some("Marker genes of the carbon, sulfur and nitrogen cycles normalized to RpS3".into()),
        input: master_input(),
        samples: depth_axis(),
        filters: vec![RowFilter::OneOf {
            column: ANNOTATION.into(),
            values: GENES.iter().map(|(gene, _)| gene.to_string()).collect(),
        }],
        classify: ClassifyConfig {
            columns: vec![ANNOTATION.into()],
            membership: Membership::Exclusive,
            rules: GENES.iter().map(|(gene, _)| RuleSpec::exact(gene)).collect(),
            fallback: Fallback::default(),
        },
        normalization: rps3_reference(),
        buckets: GENES
            .iter()
            .map(|(gene, element)| BucketSpec::plain(gene).in_group(element))
            .collect(),
        color_groups: Some(ColorGroups {
            column: None,
            unknown: "Unknown".into(),
            colors: vec![
                NamedColor::new("Carbon", "#fbbd65"),
                NamedColor::new("Sulfur", "#d88c8c"),
                NamedColor::new("Nitrogen", "#b8d39b"),
            ],
        }),
        output: OutputConfig {
            csv: Some("Figure_5_summarized_data_normalized_abundances_marker_genes.csv".into()),
            csv_values: CsvValues::Normalized,
            round: Some(6),
            index_header: String::new(),
            chart: Some(ChartSpec::Bubble {
                path: "Figure_5_manuscript__marker_genes.svg".into(),
                options: BubbleChart {
                    title: "Marker genes".into(),
                    scale: 800.0,
                    size_legend: vec![0.05, 0.1, 0.2, 0.3, 0.6, 0.8],
                    size_legend_title: "Normalized marker gene abundance".into(),
                    color_legend_title: "Element".into(),
                    size: (1200, 800),
                },
            }),
            ..Default::default()
        },
    }
}

/// 16S OTU table at 97 % identity, keyword-classified over five label columns.
pub fn otu97() -> FigureConfig {
    let rules = vec![
        RuleSpec::whole_word("Candidatus Bathyarchaeia", &["crenarchaeota"]),
        RuleSpec::whole_word("Acidobacteria", &["acidobacteria"]),
        RuleSpec::whole_word("Actinobacteria", &["actinobacteria"]),
        RuleSpec::whole_word("Aminicenantes", &["aminicenantes"]),
        RuleSpec::whole_word("Alphaproteobacteria", &["alphaproteobacteria"]),
        RuleSpec::whole_word("Deltaproteobacteria", &["deltaproteobacteria"]),
        RuleSpec::whole_word("Gammaproteobacteria", &["gammaproteobacteria"]),
        RuleSpec::whole_word("Anaerolineae", &["anaerolineae"]),
        RuleSpec::whole_word("Dehalococcoidia", &["dehalococcoidia"]),
        RuleSpec::whole_word("Other Chloroflexi", &["chloroflexi"])
            .excluding(&["anaerolineae", "dehalococcoidia"]),
        RuleSpec::whole_word("Bacteroidetes", &["bacteroidetes"]),
        RuleSpec::whole_word("Caldiserica", &["caldiserica"]),
        RuleSpec::whole_word("Atribacteria", &["atribacteria"]),
        RuleSpec::whole_word("Cyanobacteria/Chloroplast", &["cyanobacteria", "chloroplast"]),
        RuleSpec::whole_word("Firmicutes", &["firmicutes"]),
        RuleSpec::whole_word("Nitrospirae", &["nitrospirae"]),
        RuleSpec::whole_word("Planctomycetes", &["planctomycetes"]),
        RuleSpec::whole_word("Rhodothermaeota", &["rhodothermaeota"]),
        RuleSpec::whole_word("Spirochaetes", &["spirochaetes"]),
        RuleSpec::whole_word("Verrucomicrobia", &["verrucomicrobia"]),
        RuleSpec::whole_word("Woesearchaeota", &["woesearchaeota"]),
        RuleSpec::whole_word("Euryarchaeota", &["euryarchaeota"]),
        RuleSpec::whole_word("Candidatus Pacearchaeota", &["pacearchaeota"]),
    ];
    const COLORS: [(&str, &str); 24] = [
        ("Candidatus Bathyarchaeia", "#191970"),
        ("Acidobacteria", "#7fffd4"),
        ("Actinobacteria", "#228b22"),
        ("Aminicenantes", "#528b8b"),
        ("Alphaproteobacteria", "#dda0dd"),
        ("Deltaproteobacteria", "#ff0000"),
        ("Gammaproteobacteria", "#ffc1c1"),
        ("Anaerolineae", "#8b0000"),
        ("Dehalococcoidia", "#c0ff3e"),
        ("Other Chloroflexi", "#2f4f4f"),
        ("Bacteroidetes", "#00ffff"),
        ("Caldiserica", "#c1ffc1"),
        ("Atribacteria", "#ff8c00"),
        ("Cyanobacteria/Chloroplast", "#ffff00"),
        ("Firmicutes", "#ffebcd"),
        ("Nitrospirae", "#000000"),
        ("Planctomycetes", "#473d8b"),
        ("Rhodothermaeota", "#20b2aa"),
        ("Spirochaetes", "#ff6a6a"),
        ("Verrucomicrobia", "#c6e2ff"),
        ("Woesearchaeota", "#9400d3"),
        ("Euryarchaeota", "#ba2552"),
        ("Candidatus Pacearchaeota", "#00ff00"),
        ("Others", "#808080"),
    ];

    FigureConfig {
        name: "otu97".into(),
        description: Some("16S OTU relative abundance by taxonomic group and depth".into()),
        input: InputOptions {
            default_file: Some(OTU_TABLE.into()),
            ..Default::default()
        },
        samples: DEPTHS
            .iter()
            .map(|column| SampleSpec::Renamed {
                id: column.replace("_cm", "cm"),
                column: column.to_string(),
            })
            .collect(),
        filters: Vec::new(),
        classify: ClassifyConfig {
            columns: ["taxonomy", "a", "b", "c", "d"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            membership: Membership::Exclusive,
            rules,
            fallback: Fallback::default(),
        },
        normalization: NormalizationSpec::ShareOfTotal,
        buckets: COLORS
            .iter()
            .map(|(name, color)| BucketSpec::colored(name, color))
            .collect(),
        color_groups: None,
        output: OutputConfig {
            csv: Some("OTU_97_aggregated_abundance.csv".into()),
            csv_values: CsvValues::Raw,
            index_header: String::new(),
            chart: Some(ChartSpec::StackedBar {
                path: "OTU_97_relative_abundance_plot.svg".into(),
                options: BarChart {
                    title: "Taxonomic Group Relative Abundance by Sample Depth".into(),
                    x_label: "Relative Abundance".into(),
                    y_label: "Sample Depth (cm)".into(),
                    legend_title: "Taxonomic group".into(),
                    size: (800, 1000),
                },
            }),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::build_rules;
    use std::collections::HashSet;

    #[test]
    fn test_by_name_matches_names() {
        for name in NAMES {
            assert_eq!(by_name(name).unwrap().name, name);
        }
        assert!(by_name("figure2").is_none());
        assert_eq!(all().len(), NAMES.len());
    }

    #[test]
    fn test_presets_roundtrip_yaml() {
        for preset in all() {
            let yaml = preset.to_yaml().unwrap();
            assert_eq!(FigureConfig::from_yaml(&yaml).unwrap(), preset);
        }
    }

    #[test]
    fn test_presets_are_well_formed() {
        for preset in all() {
            build_rules(&preset.classify.rules).unwrap();
            let names: HashSet<&str> = preset.bucket_order().into_iter().collect();
            assert_eq!(names.len(), preset.buckets.len(), "{}", preset.name);
            assert_eq!(preset.samples.len(), 13);
            for bucket in &preset.buckets {
                if let Some(color) = &bucket.color {
                    crate::render::parse_hex(color).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_otu97_sample_ids() {
        let preset = otu97();
        assert_eq!(preset.samples[0].id(), "3cm");
        assert_eq!(preset.samples[0].column(), "3_cm");
    }
}
