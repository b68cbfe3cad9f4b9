#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the venue density analysis.
//!
//! Loads a region catalog (built-in or from a TOML file) and a JSON array
//! of venues, runs the analysis pipeline, and writes the report as JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use venue_density_analytics::correlation::CorrelationBasis;
use venue_density_pipeline::{AnalysisPipeline, AnalysisReport, PipelineConfig};
use venue_density_region::{RegionCatalog, registry};
use venue_density_venue_models::{Venue, VenueCategory};

#[derive(Parser)]
#[command(name = "venue_density", about = "Venue density leading-indicator analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in region catalogs
    Catalogs,
    /// Analyze a venue list against a region catalog
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Built-in catalog id
    #[arg(long, conflicts_with = "catalog_file")]
    catalog: Option<String>,

    /// Path to a catalog TOML file
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    /// Path to a JSON array of venues
    #[arg(long)]
    entities: PathBuf,

    /// Seed for the simulated series
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Largest lag (in years) to evaluate in either direction
    #[arg(long, default_value_t = 2)]
    max_lag: u32,

    /// Only analyze venues of this category (e.g. `wine_shop`)
    #[arg(long, value_parser = parse_category)]
    category: Option<VenueCategory>,

    /// Correlate raw values instead of year-over-year growth rates
    #[arg(long)]
    values: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

const DEFAULT_CATALOG: &str = "berlin";

fn parse_category(value: &str) -> Result<VenueCategory, String> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = VenueCategory::all().iter().map(AsRef::as_ref).collect();
        format!("unknown category '{value}' (expected one of {})", known.join(", "))
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Catalogs => {
            for catalog in registry::all_catalogs() {
                println!(
                    "{}\t{} ({} regions, {}..={})",
                    catalog.id(),
                    catalog.name(),
                    catalog.regions().len(),
                    catalog.year_range().start,
                    catalog.year_range().end
                );
            }
        }
        Commands::Analyze(args) => analyze(&args)?,
    }

    Ok(())
}

fn analyze(args: &AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(args)?;
    let venues = load_venues(&args.entities)?;

    let config = PipelineConfig {
        seed: args.seed,
        max_lag: args.max_lag,
        category: args.category,
        basis: if args.values {
            CorrelationBasis::Values
        } else {
            CorrelationBasis::GrowthRates
        },
        years: None,
    };
    let report = AnalysisPipeline::new(catalog, config)?.run(&venues);

    for region in &report.regions {
        if let Some(best) = &region.best_lag {
            log::info!(
                "{}: r = {:.3} at lag {} ({}, {:?})",
                region.region(),
                best.correlation,
                best.lag,
                best.interpretation,
                best.strength
            );
        }
    }

    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_report(&mut writer, &report, args.pretty)?;
            writer.flush()?;
            log::info!("Wrote report to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write_report(&mut writer, &report, args.pretty)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}

fn load_catalog(args: &AnalyzeArgs) -> Result<RegionCatalog, Box<dyn std::error::Error>> {
    if let Some(path) = &args.catalog_file {
        log::info!("Loading catalog from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        return Ok(registry::parse_catalog_toml(&contents)?);
    }
    let id = args.catalog.as_deref().unwrap_or(DEFAULT_CATALOG);
    Ok(registry::catalog_by_id(id)?)
}

fn load_venues(path: &Path) -> Result<Vec<Venue>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let venues: Vec<Venue> = serde_json::from_reader(reader)?;
    log::info!("Loaded {} venues from {}", venues.len(), path.display());
    Ok(venues)
}

fn write_report<W: std::io::Write>(
    writer: W,
    report: &AnalysisReport,
    pretty: bool,
) -> serde_json::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, report)
    } else {
        serde_json::to_writer(writer, report)
    }
}
