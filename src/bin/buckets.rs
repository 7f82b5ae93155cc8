//! buckets - Taxon and function bucket aggregation CLI
//!
//! Command-line interface for turning annotated abundance tables into
//! figure-ready bucket tables and charts.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use taxon_buckets::data::SampleAxis;
use taxon_buckets::error::{BucketError, Result};
use taxon_buckets::pipeline::{FigureConfig, Pipeline};
use taxon_buckets::presets;
use taxon_buckets::profile::profile_table;
use tracing_subscriber::EnvFilter;

/// Output format of the profile command
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileFormat {
    Text,
    Json,
    Yaml,
}

/// Taxon and function bucket aggregation
#[derive(Parser)]
#[command(name = "buckets")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a figure from a YAML configuration file
    Run {
        /// Path to figure configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the abundance table
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the CSV and chart are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Run a built-in figure preset
    Preset {
        /// Preset name (see `buckets presets`)
        #[arg(short, long)]
        name: String,

        /// Path to the abundance table (defaults to the preset's table)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory the CSV and chart are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Write a preset as an editable YAML configuration
    Example {
        /// Preset to export
        #[arg(short, long, default_value = "figure4")]
        preset: String,

        /// Output path for the YAML file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the built-in presets
    Presets,

    /// Profile the sample columns of an abundance table
    Profile {
        /// Path to the abundance table
        #[arg(short, long)]
        input: PathBuf,

        /// Figure configuration naming the sample columns
        #[arg(short, long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Built-in preset naming the sample columns
        #[arg(short, long)]
        preset: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ProfileFormat,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output_dir,
        } => cmd_run(&config, &input, &output_dir),

        Commands::Preset {
            name,
            input,
            output_dir,
        } => cmd_preset(&name, input.as_deref(), &output_dir),

        Commands::Example { preset, output } => cmd_example(&preset, &output),

        Commands::Presets => cmd_presets(),

        Commands::Profile {
            input,
            config,
            preset,
            format,
        } => cmd_profile(&input, config.as_deref(), preset.as_deref(), format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn find_preset(name: &str) -> Result<FigureConfig> {
    presets::by_name(name).ok_or_else(|| {
        BucketError::InvalidParameter(format!(
            "unknown preset '{}', expected one of: {}",
            name,
            presets::NAMES.join(", ")
        ))
    })
}

/// Run a figure from configuration
fn cmd_run(config_path: &Path, input_path: &Path, output_dir: &Path) -> Result<()> {
    eprintln!("Loading figure configuration from {:?}...", config_path);
    let config = FigureConfig::from_path(config_path)?;
    run_figure(&config, input_path, output_dir)
}

/// Run a built-in preset
fn cmd_preset(name: &str, input_path: Option<&Path>, output_dir: &Path) -> Result<()> {
    let config = find_preset(name)?;
    let input_path = match (input_path, config.input.default_file.as_deref()) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(default)) => default.to_path_buf(),
        (None, None) => {
            return Err(BucketError::InvalidParameter(format!(
                "preset '{}' has no default input, pass --input",
                name
            )))
        }
    };
    run_figure(&config, &input_path, output_dir)
}

fn run_figure(config: &FigureConfig, input_path: &Path, output_dir: &Path) -> Result<()> {
    let pipeline = Pipeline::from_config(config);
    let config = pipeline.config();

    eprintln!("Loading data...");
    let table = pipeline.load(input_path)?;
    eprintln!(
        "Loaded {} records x {} columns",
        table.n_records(),
        table.headers().len()
    );

    eprintln!("Running figure '{}'...", config.name);
    let figure = pipeline.run(&table)?;

    eprintln!("Writing results to {:?}...", output_dir);
    std::fs::create_dir_all(output_dir)?;
    let written = figure.write(output_dir)?;

    eprintln!(
        "Done! {} records in {} buckets",
        figure.n_records,
        figure.raw.n_buckets()
    );
    for path in &written {
        eprintln!("  wrote {:?}", path);
    }
    if !figure.warnings.is_empty() {
        eprintln!("  {} warnings", figure.warnings.len());
    }
    Ok(())
}

/// Export a preset as YAML
fn cmd_example(preset: &str, output_path: &Path) -> Result<()> {
    let config = find_preset(preset)?;
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote {} configuration to {:?}", preset, output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}

fn cmd_presets() -> Result<()> {
    for preset in presets::all() {
        println!(
            "{:<10} {}",
            preset.name,
            preset.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cmd_profile(
    input_path: &Path,
    config_path: Option<&Path>,
    preset: Option<&str>,
    format: ProfileFormat,
) -> Result<()> {
    let config = match (config_path, preset) {
        (Some(path), _) => FigureConfig::from_path(path)?,
        (None, Some(name)) => find_preset(name)?,
        (None, None) => {
            return Err(BucketError::InvalidParameter(
                "profile needs --config or --preset to name the sample columns".to_string(),
            ))
        }
    };

    eprintln!("Loading data...");
    let table = Pipeline::from_config(&config).load(input_path)?;
    let axis = SampleAxis::from_specs(&config.samples)?;
    let profile = profile_table(&table, &axis)?;

    match format {
        ProfileFormat::Text => print!("{}", profile),
        ProfileFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        ProfileFormat::Yaml => print!("{}", serde_yaml::to_string(&profile)?),
    }
    Ok(())
}
