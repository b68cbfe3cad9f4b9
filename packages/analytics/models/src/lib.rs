#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the analytics engine.
//!
//! These are the read-only outputs consumed by renderers and report writers:
//! per-region density metrics, yearly time series (observed or synthetic),
//! growth summaries, and lagged correlation tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a [`TimeSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    /// Years are not strictly ascending.
    #[error("Year {year} does not follow {previous}; series years must be strictly ascending")]
    UnorderedYears {
        /// The preceding year.
        previous: i32,
        /// The offending year.
        year: i32,
    },

    /// A value is negative or not finite.
    #[error("Invalid series value {value} for year {year}")]
    InvalidValue {
        /// Year of the offending point.
        year: i32,
        /// The value.
        value: f64,
    },
}

/// Per-region density and accessibility metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityMetrics {
    /// Region name (or the fallback label).
    pub region: String,
    /// Number of venues assigned to the region.
    pub count: u64,
    /// Area used for normalization in km².
    pub area_km2: f64,
    /// Population used for normalization.
    pub population: Option<u64>,
    /// Venues per km², 0 when the area is not positive.
    pub density_per_km2: f64,
    /// Venues per 100,000 residents, 0 when the population is unknown or 0.
    pub per_capita_per_100k: f64,
}

/// One yearly observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Calendar year.
    pub year: i32,
    /// Non-negative value.
    pub value: f64,
}

impl SeriesPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(year: i32, value: f64) -> Self {
        Self { year, value }
    }
}

/// Where a series' values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesOrigin {
    /// Measured data supplied by a caller.
    Observed,
    /// Simulated values; reproducible from the seed.
    Synthetic {
        /// Seed the series was generated with.
        seed: u64,
    },
}

/// Year-over-year growth from `previous` to `current`.
///
/// `1.0` when growing from zero, `0.0` when both are zero.
#[must_use]
pub fn yoy_rate(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous
    } else if current > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// A chronological yearly series for one region.
///
/// Years are strictly ascending and values are finite and non-negative.
/// `yoy_rates` runs parallel to the points; the first entry is `None`
/// since the first year has no predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    region: String,
    origin: SeriesOrigin,
    points: Vec<SeriesPoint>,
    yoy_rates: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Creates an observed series.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError`] if years are not strictly ascending or a
    /// value is negative or not finite.
    pub fn observed(
        region: impl Into<String>,
        points: Vec<SeriesPoint>,
    ) -> Result<Self, SeriesError> {
        Self::with_origin(region, SeriesOrigin::Observed, points)
    }

    /// Creates a series with an explicit origin.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError`] if years are not strictly ascending or a
    /// value is negative or not finite.
    pub fn with_origin(
        region: impl Into<String>,
        origin: SeriesOrigin,
        points: Vec<SeriesPoint>,
    ) -> Result<Self, SeriesError> {
        for point in &points {
            if !point.value.is_finite() || point.value < 0.0 {
                return Err(SeriesError::InvalidValue {
                    year: point.year,
                    value: point.value,
                });
            }
        }
        for pair in points.windows(2) {
            if pair[1].year <= pair[0].year {
                return Err(SeriesError::UnorderedYears {
                    previous: pair[0].year,
                    year: pair[1].year,
                });
            }
        }

        let yoy_rates = std::iter::once(None)
            .chain(
                points
                    .windows(2)
                    .map(|pair| Some(yoy_rate(pair[0].value, pair[1].value))),
            )
            .take(points.len())
            .collect();

        Ok(Self {
            region: region.into(),
            origin,
            points,
            yoy_rates,
        })
    }

    /// Region name.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Where the values came from.
    #[must_use]
    pub const fn origin(&self) -> SeriesOrigin {
        self.origin
    }

    /// Whether the values were simulated.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self.origin, SeriesOrigin::Synthetic { .. })
    }

    /// Points in chronological order.
    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Year-over-year rates parallel to [`Self::points`].
    #[must_use]
    pub fn yoy_rates(&self) -> &[Option<f64>] {
        &self.yoy_rates
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value recorded for `year`.
    #[must_use]
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    /// Year-over-year rate recorded for `year`.
    #[must_use]
    pub fn yoy_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .and_then(|idx| self.yoy_rates[idx])
    }

    /// Converts the value series into its year-over-year rate series
    /// (dropping the undefined first year).
    ///
    /// Rates can be negative, so the result is a plain list of pairs
    /// rather than a [`TimeSeries`].
    #[must_use]
    pub fn rate_points(&self) -> Vec<(i32, f64)> {
        self.points
            .iter()
            .zip(&self.yoy_rates)
            .filter_map(|(p, rate)| rate.map(|r| (p.year, r)))
            .collect()
    }
}

/// A simulated series.
///
/// Kept as a distinct type so simulated history cannot be passed off as
/// observed data; callers must unwrap it explicitly with
/// [`Self::as_series`] or [`Self::into_series`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyntheticSeries(TimeSeries);

impl SyntheticSeries {
    /// Wraps simulated points.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError`] under the same rules as
    /// [`TimeSeries::with_origin`].
    pub fn new(
        region: impl Into<String>,
        seed: u64,
        points: Vec<SeriesPoint>,
    ) -> Result<Self, SeriesError> {
        TimeSeries::with_origin(region, SeriesOrigin::Synthetic { seed }, points).map(Self)
    }

    /// Seed the series was generated with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        match self.0.origin {
            SeriesOrigin::Synthetic { seed } => seed,
            SeriesOrigin::Observed => 0,
        }
    }

    /// Borrows the underlying series (still tagged synthetic).
    #[must_use]
    pub const fn as_series(&self) -> &TimeSeries {
        &self.0
    }

    /// Unwraps the underlying series (still tagged synthetic).
    #[must_use]
    pub fn into_series(self) -> TimeSeries {
        self.0
    }
}

/// Growth statistics for one region's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSummary {
    /// Region name.
    pub region: String,
    /// First year of the series.
    pub start_year: i32,
    /// Last year of the series.
    pub end_year: i32,
    /// Value in the first year.
    pub start_value: f64,
    /// Value in the last year.
    pub end_value: f64,
    /// `(end - start) / start`, zero-guarded.
    pub total_growth: f64,
    /// Compound annual growth rate, zero-guarded.
    pub cagr: f64,
    /// Mean of the defined year-over-year rates.
    pub avg_yoy: f64,
    /// Sample standard deviation of the defined year-over-year rates.
    /// `None` with fewer than two defined rates.
    pub volatility: Option<f64>,
    /// Year with the highest year-over-year rate (earliest on ties).
    pub peak_year: i32,
    /// The highest year-over-year rate.
    pub peak_rate: f64,
}

/// Qualitative direction of a lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagDirection {
    /// Positive lag: the first series leads the second.
    Leading,
    /// Zero lag.
    Simultaneous,
    /// Negative lag: the second series leads the first.
    Lagging,
}

impl LagDirection {
    /// Direction for a signed lag.
    #[must_use]
    pub const fn from_lag(lag: i32) -> Self {
        if lag > 0 {
            Self::Leading
        } else if lag < 0 {
            Self::Lagging
        } else {
            Self::Simultaneous
        }
    }
}

/// Why a correlation could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Fewer than three paired samples.
    InsufficientOverlap,
    /// The window includes a year absent from one of the series.
    MissingObservations,
    /// One side is constant across the window.
    ZeroVariance,
}

/// Outcome of a Pearson correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    /// A finite coefficient and its two-sided p-value.
    Defined {
        /// Pearson r in `[-1, 1]`.
        correlation: f64,
        /// Two-sided p-value from the t-distribution approximation.
        p_value: f64,
    },
    /// No coefficient exists for this input.
    Undefined {
        /// Why.
        reason: UndefinedReason,
    },
}

impl CorrelationOutcome {
    /// The coefficient, if defined.
    #[must_use]
    pub const fn correlation(&self) -> Option<f64> {
        match self {
            Self::Defined { correlation, .. } => Some(*correlation),
            Self::Undefined { .. } => None,
        }
    }

    /// The p-value, if defined.
    #[must_use]
    pub const fn p_value(&self) -> Option<f64> {
        match self {
            Self::Defined { p_value, .. } => Some(*p_value),
            Self::Undefined { .. } => None,
        }
    }
}

/// Strength of a leading-indicator relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStrength {
    /// r > 0.7
    Strong,
    /// 0.4 < r <= 0.7
    Moderate,
    /// r <= 0.4
    Weak,
}

impl IndicatorStrength {
    /// Classifies a correlation coefficient.
    #[must_use]
    pub fn classify(correlation: f64) -> Self {
        if correlation > 0.7 {
            Self::Strong
        } else if correlation > 0.4 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

/// Correlation at one lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagResult {
    /// Signed lag in years. Positive means the first series leads.
    pub lag: i32,
    /// Direction derived from the lag sign.
    pub direction: LagDirection,
    /// Number of paired samples in the lag window.
    pub sample_size: usize,
    /// Coefficient and p-value, or why there is none.
    pub outcome: CorrelationOutcome,
}

impl LagResult {
    /// The coefficient, if defined.
    #[must_use]
    pub const fn correlation(&self) -> Option<f64> {
        self.outcome.correlation()
    }

    /// Human-readable interpretation, e.g. `"X leads Y by 1 year"`.
    #[must_use]
    pub fn interpretation(&self, x_label: &str, y_label: &str) -> String {
        let years = self.lag.unsigned_abs();
        let unit = if years == 1 { "year" } else { "years" };
        match self.direction {
            LagDirection::Leading => format!("{x_label} leads {y_label} by {years} {unit}"),
            LagDirection::Simultaneous => "simultaneous".to_string(),
            LagDirection::Lagging => format!("{y_label} leads {x_label} by {years} {unit}"),
        }
    }
}

/// Correlations of two series over a range of lags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagTable {
    /// Label of the first (X) series.
    pub x_label: String,
    /// Label of the second (Y) series.
    pub y_label: String,
    /// Lags were evaluated over `-max_lag..=max_lag`.
    pub max_lag: u32,
    /// Results keyed by lag.
    pub results: BTreeMap<i32, LagResult>,
}

impl LagTable {
    /// Result at `lag`.
    #[must_use]
    pub fn get(&self, lag: i32) -> Option<&LagResult> {
        self.results.get(&lag)
    }

    /// The lag with the highest defined correlation.
    ///
    /// Ties go to the smallest absolute lag, then to the more negative lag.
    /// `None` when no lag has a defined correlation.
    #[must_use]
    pub fn best(&self) -> Option<&LagResult> {
        self.results
            .values()
            .filter_map(|r| r.correlation().map(|c| (r, c)))
            .min_by(|(a, ca), (b, cb)| {
                cb.total_cmp(ca)
                    .then_with(|| a.lag.unsigned_abs().cmp(&b.lag.unsigned_abs()))
                    .then_with(|| a.lag.cmp(&b.lag))
            })
            .map(|(r, _)| r)
    }

    /// Interpretation of the best lag, using this table's labels.
    #[must_use]
    pub fn best_interpretation(&self) -> Option<String> {
        self.best()
            .map(|r| r.interpretation(&self.x_label, &self.y_label))
    }
}

/// Which series reached its peak growth year first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakOrder {
    /// The first series peaked earlier.
    XFirst,
    /// Both peaked in the same year.
    Simultaneous,
    /// The second series peaked earlier.
    YFirst,
}

/// Peak growth timing of two series for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakComparison {
    /// Region name.
    pub region: String,
    /// Peak year of the first series.
    pub x_peak_year: i32,
    /// Peak year of the second series.
    pub y_peak_year: i32,
    /// `y_peak_year - x_peak_year`.
    pub lead_time: i32,
    /// Which peaked first.
    pub order: PeakOrder,
}

/// Cross-sectional correlation of two per-region metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCorrelation {
    /// What is being compared.
    pub description: String,
    /// Number of regions with both metrics.
    pub sample_size: usize,
    /// Coefficient and p-value, or why there is none.
    pub outcome: CorrelationOutcome,
}
