//! Report types produced by [`crate::AnalysisPipeline`].
//!
//! Everything here is read-only output for renderers and report writers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use venue_density_analytics_models::{
    DensityMetrics, GrowthSummary, IndicatorStrength, LagTable, MetricCorrelation,
    PeakComparison, SyntheticSeries,
};
use venue_density_region_models::YearRange;
use venue_density_spatial::DroppedVenue;
use venue_density_venue_models::VenueCategory;

/// Stage of per-region processing that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Backward synthesis of the density series.
    DensitySynthesis,
    /// Growth summary of the density series.
    DensityGrowth,
    /// Forward projection of the price series.
    PriceProjection,
    /// Growth summary of the price series.
    PriceGrowth,
    /// Lag correlation of density against price.
    LagCorrelation,
}

/// A per-region error that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionFailure {
    /// Region name.
    pub region: String,
    /// Where it failed.
    pub stage: PipelineStage,
    /// Error message.
    pub message: String,
}

/// The strongest lag of a [`LagTable`], ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestLag {
    /// Lag in years (positive: X leads).
    pub lag: i32,
    /// Pearson coefficient.
    pub correlation: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// e.g. `"Venue density leads Price by 1 year"`.
    pub interpretation: String,
    /// Qualitative strength of the coefficient.
    pub strength: IndicatorStrength,
}

impl BestLag {
    /// Picks the best lag of `table`, `None` when no lag is defined.
    #[must_use]
    pub fn from_table(table: &LagTable) -> Option<Self> {
        let best = table.best()?;
        let correlation = best.outcome.correlation()?;
        let p_value = best.outcome.p_value()?;
        Some(Self {
            lag: best.lag,
            correlation,
            p_value,
            interpretation: best.interpretation(&table.x_label, &table.y_label),
            strength: IndicatorStrength::classify(correlation),
        })
    }
}

/// Everything computed for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionReport {
    /// Present-day density.
    pub density: DensityMetrics,
    /// Simulated density history.
    pub density_series: Option<SyntheticSeries>,
    /// `floor(density × area)` per year of the simulated history.
    pub estimated_counts: Option<BTreeMap<i32, u64>>,
    /// Growth of the simulated density history.
    pub density_growth: Option<GrowthSummary>,
    /// Simulated price history.
    pub price_series: Option<SyntheticSeries>,
    /// Growth of the simulated price history.
    pub price_growth: Option<GrowthSummary>,
    /// Density vs price lag correlations.
    pub lag_table: Option<LagTable>,
    /// Strongest entry of `lag_table`.
    pub best_lag: Option<BestLag>,
    /// Density vs price peak growth timing.
    pub peaks: Option<PeakComparison>,
}

impl RegionReport {
    /// Region name.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.density.region
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Catalog the run used.
    pub catalog_id: String,
    /// Global noise seed.
    pub seed: u64,
    /// Lags were evaluated over `-max_lag..=max_lag`.
    pub max_lag: u32,
    /// Years of the simulated density history.
    pub years: YearRange,
    /// Category filter applied before assignment.
    pub category: Option<VenueCategory>,
    /// Venues passed in.
    pub total_venues: usize,
    /// Venues left after the category filter.
    pub considered_venues: usize,
    /// Venues assigned to a region (including the fallback).
    pub assigned_venues: usize,
    /// Venues that could not be assigned.
    pub dropped: Vec<DroppedVenue>,
    /// Per-region results, densest first.
    pub regions: Vec<RegionReport>,
    /// Per-region errors.
    pub failures: Vec<RegionFailure>,
    /// Cross-sectional correlations between region metrics.
    pub metric_correlations: Vec<MetricCorrelation>,
    /// Mean correlation per lag across regions.
    pub lag_profile: BTreeMap<i32, Option<f64>>,
    /// Lag correlations of the city-wide averaged series.
    pub city_lag_table: Option<LagTable>,
    /// Strongest entry of `city_lag_table`.
    pub city_best_lag: Option<BestLag>,
}

impl AnalysisReport {
    /// Report for `region`.
    #[must_use]
    pub fn region(&self, region: &str) -> Option<&RegionReport> {
        self.regions.iter().find(|r| r.region() == region)
    }

    /// Failures recorded for `region`.
    pub fn failures_for<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a RegionFailure> {
        self.failures.iter().filter(move |f| f.region == region)
    }
}
