#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end analysis of venue density against price growth.
//!
//! Chains category filter -> region assignment -> density normalization ->
//! historical synthesis -> growth summaries -> price projection -> lag
//! correlation into a single [`AnalysisReport`]. Per-region errors are
//! recorded in the report and never abort the run.

pub mod report;

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use venue_density_analytics::correlation::{
    CorrelationBasis, CrossCorrelationAnalyzer, lag_profile, metric_correlation,
};
use venue_density_analytics::synthesis::{HistoricalSeriesSynthesizer, estimated_counts};
use venue_density_analytics::{density, growth, peaks, projection};
use venue_density_analytics_models::{
    DensityMetrics, LagTable, MetricCorrelation, SeriesPoint, SyntheticSeries, TimeSeries,
};
use venue_density_region::{CatalogError, RegionCatalog, registry};
use venue_density_region_models::YearRange;
use venue_density_spatial::RegionAssigner;
use venue_density_venue_models::{Venue, VenueCategory};

pub use report::{AnalysisReport, BestLag, PipelineStage, RegionFailure, RegionReport};

/// Label of the density series in lag tables.
pub const DENSITY_LABEL: &str = "Venue density";
/// Label of the price series in lag tables.
pub const PRICE_LABEL: &str = "Price";
/// Region name used for the city-wide averaged series.
pub const CITY_LABEL: &str = "City";

/// Errors that stop a pipeline before it runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The region catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The requested history range is empty.
    #[error("Invalid year range {start}..={end}")]
    InvalidYearRange {
        /// First year.
        start: i32,
        /// Last year.
        end: i32,
    },
}

/// Run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Global seed for all simulated series.
    pub seed: u64,
    /// Lags are evaluated over `-max_lag..=max_lag`.
    pub max_lag: u32,
    /// Only venues of this category are analyzed.
    pub category: Option<VenueCategory>,
    /// Which view of the series is correlated.
    pub basis: CorrelationBasis,
    /// History to synthesize; defaults to the catalog's trailing range.
    pub years: Option<YearRange>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_lag: 2,
            category: None,
            basis: CorrelationBasis::GrowthRates,
            years: None,
        }
    }
}

/// A configured analysis over one region catalog.
#[derive(Debug)]
pub struct AnalysisPipeline {
    catalog: RegionCatalog,
    assigner: RegionAssigner,
    config: PipelineConfig,
    years: YearRange,
}

impl AnalysisPipeline {
    /// Prepares a pipeline over `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidYearRange`] if the configured year
    /// range is empty.
    pub fn new(catalog: RegionCatalog, config: PipelineConfig) -> Result<Self, PipelineError> {
        let years = config.years.unwrap_or_else(|| catalog.year_range());
        if years.is_empty() {
            return Err(PipelineError::InvalidYearRange {
                start: years.start,
                end: years.end,
            });
        }
        let assigner = RegionAssigner::from_catalog(&catalog);
        Ok(Self {
            catalog,
            assigner,
            config,
            years,
        })
    }

    /// Prepares a pipeline over a built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Catalog`] if no valid catalog is registered
    /// under `id`, or [`PipelineError::InvalidYearRange`] as in [`Self::new`].
    pub fn from_catalog_id(id: &str, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::new(registry::catalog_by_id(id)?, config)
    }

    /// The catalog being analyzed.
    #[must_use]
    pub const fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// Run parameters.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyzes `venues`.
    #[must_use]
    pub fn run(&self, venues: &[Venue]) -> AnalysisReport {
        let start = Instant::now();
        log::info!(
            "Analyzing {} venues against catalog '{}' (seed {}, years {}..={})",
            venues.len(),
            self.catalog.id(),
            self.config.seed,
            self.years.start,
            self.years.end
        );

        let filtered: Vec<Venue>;
        let considered = match self.config.category {
            Some(category) => {
                filtered = venues
                    .iter()
                    .filter(|v| v.has_category(category))
                    .cloned()
                    .collect();
                log::info!("{} of {} venues are {category}", filtered.len(), venues.len());
                filtered.as_slice()
            }
            None => venues,
        };

        let assignment = self.assigner.assign(considered);
        let metrics = density::rank_by_density(&density::normalize(&assignment, &self.catalog));

        let outcomes: Vec<(RegionReport, Vec<RegionFailure>)> = metrics
            .into_par_iter()
            .map(|m| self.analyze_region(m))
            .collect();

        let mut regions = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (report, region_failures) in outcomes {
            for failure in &region_failures {
                log::warn!(
                    "Region '{}' failed at {:?}: {}",
                    failure.region,
                    failure.stage,
                    failure.message
                );
            }
            regions.push(report);
            failures.extend(region_failures);
        }

        let lag_profile = lag_profile(regions.iter().filter_map(|r| r.lag_table.as_ref()));
        let city_lag_table = self.city_lag_table(&regions);
        let city_best_lag = city_lag_table.as_ref().and_then(BestLag::from_table);

        let report = AnalysisReport {
            catalog_id: self.catalog.id().to_string(),
            seed: self.config.seed,
            max_lag: self.config.max_lag,
            years: self.years,
            category: self.config.category,
            total_venues: venues.len(),
            considered_venues: considered.len(),
            assigned_venues: assignment.assigned.len(),
            dropped: assignment.dropped,
            metric_correlations: metric_correlations(&regions),
            regions,
            failures,
            lag_profile,
            city_lag_table,
            city_best_lag,
        };

        log::info!(
            "Analysis finished in {:.2?}: {} regions, {} failures",
            start.elapsed(),
            report.regions.len(),
            report.failures.len()
        );

        report
    }

    fn analyzer(&self) -> CrossCorrelationAnalyzer {
        CrossCorrelationAnalyzer::new(self.config.max_lag).with_basis(self.config.basis)
    }

    fn analyze_region(&self, metrics: DensityMetrics) -> (RegionReport, Vec<RegionFailure>) {
        let region = metrics.region.clone();
        let seed = self.config.seed;
        let mut failures = Vec::new();
        let mut fail = |stage: PipelineStage, message: String| {
            failures.push(RegionFailure {
                region: region.clone(),
                stage,
                message,
            });
        };

        let density_series = self.catalog.growth_profile(&region).and_then(|profile| {
            HistoricalSeriesSynthesizer::new(seed)
                .synthesize(metrics.density_per_km2, profile, self.years)
                .map_err(|e| fail(PipelineStage::DensitySynthesis, e.to_string()))
                .ok()
        });
        let density_growth = density_series.as_ref().and_then(|s| {
            growth::summarize(s.as_series())
                .map_err(|e| fail(PipelineStage::DensityGrowth, e.to_string()))
                .ok()
        });

        let price_series = self.catalog.price_profile(&region).and_then(|profile| {
            projection::project(profile, seed)
                .map_err(|e| fail(PipelineStage::PriceProjection, e.to_string()))
                .ok()
        });
        let price_growth = price_series.as_ref().and_then(|s| {
            growth::summarize(s.as_series())
                .map_err(|e| fail(PipelineStage::PriceGrowth, e.to_string()))
                .ok()
        });

        let lag_table = match (&density_series, &price_series) {
            (Some(d), Some(p)) if span(d.as_series()) == span(p.as_series()) => Some(
                self.analyzer()
                    .analyze(d.as_series(), p.as_series(), DENSITY_LABEL, PRICE_LABEL),
            ),
            (Some(d), Some(p)) => {
                // Unequal spans leave lag windows with missing years.
                fail(
                    PipelineStage::LagCorrelation,
                    format!(
                        "price series spans {:?} but density series spans {:?}",
                        span(p.as_series()),
                        span(d.as_series())
                    ),
                );
                None
            }
            _ => None,
        };
        let best_lag = lag_table.as_ref().and_then(BestLag::from_table);
        let peaks = match (&density_growth, &price_growth) {
            (Some(d), Some(p)) => Some(peaks::compare_peaks(d, p)),
            _ => None,
        };
        let estimated_counts = density_series
            .as_ref()
            .and_then(|s| estimated_counts(s, metrics.area_km2));

        let report = RegionReport {
            density: metrics,
            density_series,
            estimated_counts,
            density_growth,
            price_series,
            price_growth,
            lag_table,
            best_lag,
            peaks,
        };
        (report, failures)
    }

    /// Lag table of the density and price series averaged per year over
    /// every region that has its own lag table.
    fn city_lag_table(&self, regions: &[RegionReport]) -> Option<LagTable> {
        let paired: Vec<(&SyntheticSeries, &SyntheticSeries)> = regions
            .iter()
            .filter(|r| r.lag_table.is_some())
            .filter_map(|r| Some((r.density_series.as_ref()?, r.price_series.as_ref()?)))
            .collect();
        if paired.is_empty() {
            return None;
        }

        let density = self.average_series(paired.iter().map(|(d, _)| *d))?;
        let price = self.average_series(paired.iter().map(|(_, p)| *p))?;
        Some(
            self.analyzer()
                .analyze(density.as_series(), price.as_series(), DENSITY_LABEL, PRICE_LABEL),
        )
    }

    fn average_series<'a>(
        &self,
        series: impl Iterator<Item = &'a SyntheticSeries>,
    ) -> Option<SyntheticSeries> {
        let mut sums: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
        for s in series {
            for point in s.as_series().points() {
                let entry = sums.entry(point.year).or_insert((0.0, 0));
                entry.0 += point.value;
                entry.1 += 1;
            }
        }
        let points = sums
            .into_iter()
            .map(|(year, (sum, n))| SeriesPoint::new(year, sum / f64::from(n)))
            .collect();
        SyntheticSeries::new(CITY_LABEL, self.config.seed, points)
            .map_err(|e| log::warn!("Could not build city-wide series: {e}"))
            .ok()
    }
}

/// First and last year of `series`.
fn span(series: &TimeSeries) -> Option<(i32, i32)> {
    Some((series.points().first()?.year, series.points().last()?.year))
}

/// Correlates region-level growth metrics across regions.
///
/// Each correlation only uses regions that have both metrics; with fewer
/// than three such regions the outcome is undefined.
#[must_use]
pub fn metric_correlations(regions: &[RegionReport]) -> Vec<MetricCorrelation> {
    let density_cagr = by_region(regions, |r| r.density_growth.as_ref().map(|s| s.cagr));
    let price_cagr = by_region(regions, |r| r.price_growth.as_ref().map(|s| s.cagr));
    let density_total = by_region(regions, |r| r.density_growth.as_ref().map(|s| s.total_growth));
    let price_total = by_region(regions, |r| r.price_growth.as_ref().map(|s| s.total_growth));
    let density_current = by_region(regions, |r| Some(r.density.density_per_km2));
    let price_current = by_region(regions, |r| r.price_growth.as_ref().map(|s| s.end_value));
    let density_volatility =
        by_region(regions, |r| r.density_growth.as_ref().and_then(|s| s.volatility));

    vec![
        metric_correlation("Density CAGR vs price CAGR", &density_cagr, &price_cagr),
        metric_correlation(
            "Total density growth vs total price growth",
            &density_total,
            &price_total,
        ),
        metric_correlation("Current density vs current price", &density_current, &price_current),
        metric_correlation(
            "Density volatility vs price CAGR",
            &density_volatility,
            &price_cagr,
        ),
    ]
}

fn by_region(
    regions: &[RegionReport],
    metric: impl Fn(&RegionReport) -> Option<f64>,
) -> BTreeMap<String, f64> {
    regions
        .iter()
        .filter_map(|r| metric(r).map(|v| (r.region().to_string(), v)))
        .collect()
}
