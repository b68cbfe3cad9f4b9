//! Pearson correlation and the lag sweep used to find leading indicators.
//!
//! Two yearly series are aligned on the union of their years. A positive
//! lag `k` pairs `x[year]` with `y[year + k]` ("X leads Y by k years"); a
//! negative lag pairs `x[year + |k|]` with `y[year]`. A lag window that
//! contains a year missing from either series, or has fewer than three
//! pairs, has no coefficient.

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF as _, StudentsT};
use venue_density_analytics_models::{
    CorrelationOutcome, LagDirection, LagResult, LagTable, MetricCorrelation, TimeSeries,
    UndefinedReason,
};

/// Minimum number of paired samples for a defined correlation.
pub const MIN_SAMPLES: usize = 3;

/// Which view of a [`TimeSeries`] is correlated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorrelationBasis {
    /// The raw yearly values.
    Values,
    /// Year-over-year growth rates (the first year is dropped).
    #[default]
    GrowthRates,
}

impl CorrelationBasis {
    /// Extracts `(year, value)` pairs for this basis.
    #[must_use]
    pub fn points(self, series: &TimeSeries) -> Vec<(i32, f64)> {
        match self {
            Self::Values => series.points().iter().map(|p| (p.year, p.value)).collect(),
            Self::GrowthRates => series.rate_points(),
        }
    }
}

/// Two-sided p-value of a Pearson coefficient `r` over `n` samples, using
/// the t-distribution with `n - 2` degrees of freedom.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn p_value(r: f64, n: usize) -> f64 {
    if n < MIN_SAMPLES {
        return 1.0;
    }
    let r_sq = r * r;
    if r_sq >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r_sq)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(e) => {
            log::debug!("StudentsT(df = {df}) rejected ({e})");
            1.0
        }
    }
}

/// Pearson product-moment correlation of two equally long samples.
///
/// Undefined with fewer than [`MIN_SAMPLES`] pairs, mismatched lengths, or
/// when either side has zero variance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(x: &[f64], y: &[f64]) -> CorrelationOutcome {
    let n = x.len();
    if n != y.len() || n < MIN_SAMPLES {
        return CorrelationOutcome::Undefined {
            reason: UndefinedReason::InsufficientOverlap,
        };
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if !(denom.is_finite() && denom > 0.0) {
        return CorrelationOutcome::Undefined {
            reason: UndefinedReason::ZeroVariance,
        };
    }

    let correlation = (sxy / denom).clamp(-1.0, 1.0);
    CorrelationOutcome::Defined {
        correlation,
        p_value: p_value(correlation, n),
    }
}

/// Pearson correlation of two metrics keyed by region, over the regions
/// present in both.
#[must_use]
pub fn metric_correlation(
    description: impl Into<String>,
    x: &BTreeMap<String, f64>,
    y: &BTreeMap<String, f64>,
) -> MetricCorrelation {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .filter_map(|(region, &a)| y.get(region).map(|&b| (a, b)))
        .unzip();
    MetricCorrelation {
        description: description.into(),
        sample_size: xs.len(),
        outcome: pearson(&xs, &ys),
    }
}

/// Two `(year, value)` lists keyed by year, spanning the union of their
/// years.
///
/// Only observed years are stored; the gaps of the dense grid are implied
/// by `first..=last`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedSeries {
    x: BTreeMap<i32, f64>,
    y: BTreeMap<i32, f64>,
}

impl AlignedSeries {
    /// First and last year of the union grid.
    #[must_use]
    pub fn span(&self) -> Option<(i32, i32)> {
        let first = [self.x.keys().next(), self.y.keys().next()]
            .into_iter()
            .flatten()
            .min()?;
        let last = [self.x.keys().next_back(), self.y.keys().next_back()]
            .into_iter()
            .flatten()
            .max()?;
        Some((*first, *last))
    }

    /// Number of years on the union grid, gaps included.
    #[must_use]
    pub fn grid_len(&self) -> u64 {
        self.span()
            .map_or(0, |(first, last)| (i64::from(last) - i64::from(first)).unsigned_abs() + 1)
    }

    /// Values of `x` and `y` for `year`.
    #[must_use]
    pub fn get(&self, year: i32) -> (Option<f64>, Option<f64>) {
        (self.x.get(&year).copied(), self.y.get(&year).copied())
    }
}

/// Aligns two `(year, value)` lists on the union of their years.
#[must_use]
pub fn align(x: &[(i32, f64)], y: &[(i32, f64)]) -> AlignedSeries {
    AlignedSeries {
        x: x.iter().copied().collect(),
        y: y.iter().copied().collect(),
    }
}

/// Correlation of `x` against `y` shifted by `lag` years.
#[must_use]
pub fn lag_correlation(aligned: &AlignedSeries, lag: i32) -> LagResult {
    let shift = u64::from(lag.unsigned_abs());
    let pairs = aligned.grid_len().saturating_sub(shift);
    let sample_size = usize::try_from(pairs).unwrap_or(usize::MAX);

    let outcome = match aligned.span() {
        Some((first, last)) if sample_size >= MIN_SAMPLES => {
            // At least one pair keeps both windows inside `first..=last`.
            let lo = i64::from(first);
            let hi = i64::from(last);
            let offset = i64::from(lag.unsigned_abs());
            let (x_window, y_window) = if lag >= 0 {
                ((lo, hi - offset), (lo + offset, hi))
            } else {
                ((lo + offset, hi), (lo, hi - offset))
            };
            let xs = window(&aligned.x, x_window);
            let ys = window(&aligned.y, y_window);
            if xs.len() == sample_size && ys.len() == sample_size {
                pearson(&xs, &ys)
            } else {
                CorrelationOutcome::Undefined {
                    reason: UndefinedReason::MissingObservations,
                }
            }
        }
        _ => CorrelationOutcome::Undefined {
            reason: UndefinedReason::InsufficientOverlap,
        },
    };

    LagResult {
        lag,
        direction: LagDirection::from_lag(lag),
        sample_size,
        outcome,
    }
}

/// Observed values for the years `start..=end`, in year order.
fn window(values: &BTreeMap<i32, f64>, (start, end): (i64, i64)) -> Vec<f64> {
    let (Ok(start), Ok(end)) = (i32::try_from(start), i32::try_from(end)) else {
        return Vec::new();
    };
    values.range(start..=end).map(|(_, &v)| v).collect()
}

/// Sweeps lags `-max_lag..=max_lag` between two series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossCorrelationAnalyzer {
    max_lag: u32,
    basis: CorrelationBasis,
}

impl CrossCorrelationAnalyzer {
    /// Creates an analyzer over growth rates.
    #[must_use]
    pub fn new(max_lag: u32) -> Self {
        Self {
            max_lag,
            basis: CorrelationBasis::default(),
        }
    }

    /// Sets which view of the series is correlated.
    #[must_use]
    pub const fn with_basis(mut self, basis: CorrelationBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Largest lag evaluated in either direction.
    #[must_use]
    pub const fn max_lag(&self) -> u32 {
        self.max_lag
    }

    /// The correlated view.
    #[must_use]
    pub const fn basis(&self) -> CorrelationBasis {
        self.basis
    }

    /// Correlates two series over every lag.
    #[must_use]
    pub fn analyze(
        &self,
        x: &TimeSeries,
        y: &TimeSeries,
        x_label: &str,
        y_label: &str,
    ) -> LagTable {
        self.analyze_points(&self.basis.points(x), &self.basis.points(y), x_label, y_label)
    }

    /// Correlates two `(year, value)` lists over every lag.
    #[must_use]
    pub fn analyze_points(
        &self,
        x: &[(i32, f64)],
        y: &[(i32, f64)],
        x_label: &str,
        y_label: &str,
    ) -> LagTable {
        let aligned = align(x, y);
        let max_lag = i32::try_from(self.max_lag).unwrap_or(i32::MAX);
        let results = (-max_lag..=max_lag)
            .map(|lag| (lag, lag_correlation(&aligned, lag)))
            .collect();

        LagTable {
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            max_lag: self.max_lag,
            results,
        }
    }
}

/// Mean defined correlation per lag across many tables.
///
/// Lags with no defined correlation in any table map to `None`.
#[must_use]
pub fn lag_profile<'a, I>(tables: I) -> BTreeMap<i32, Option<f64>>
where
    I: IntoIterator<Item = &'a LagTable>,
{
    let mut sums: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for table in tables {
        for (&lag, result) in &table.results {
            let entry = sums.entry(lag).or_insert((0.0, 0));
            if let Some(r) = result.correlation() {
                entry.0 += r;
                entry.1 += 1;
            }
        }
    }
    sums.into_iter()
        .map(|(lag, (sum, n))| (lag, (n > 0).then(|| sum / f64::from(n))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand::distributions::Distribution as _;
    use rand_chacha::ChaCha8Rng;
    use statrs::distribution::Normal;
    use venue_density_analytics_models::{IndicatorStrength, SeriesPoint};

    fn yearly(start: i32, values: &[f64]) -> Vec<(i32, f64)> {
        values.iter().zip(start..).map(|(&v, y)| (y, v)).collect()
    }

    #[test]
    fn perfect_and_inverse_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let r = pearson(&x, &[2.0, 4.0, 6.0, 8.0]);
        assert_relative_eq!(r.correlation().unwrap(), 1.0);
        assert_relative_eq!(r.p_value().unwrap(), 0.0);
        let r = pearson(&x, &[8.0, 6.0, 4.0, 2.0]);
        assert_relative_eq!(r.correlation().unwrap(), -1.0);
    }

    #[test]
    fn undefined_cases() {
        assert_eq!(
            pearson(&[1.0, 2.0], &[1.0, 2.0]),
            CorrelationOutcome::Undefined {
                reason: UndefinedReason::InsufficientOverlap
            }
        );
        assert_eq!(
            pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            CorrelationOutcome::Undefined {
                reason: UndefinedReason::ZeroVariance
            }
        );
    }

    #[test]
    fn p_value_matches_reference() {
        // r = 0.5 over 10 samples: t = 1.633, df = 8, two-sided p ≈ 0.1411.
        assert_relative_eq!(p_value(0.5, 10), 0.1411, epsilon = 1e-3);
        assert_relative_eq!(p_value(0.0, 10), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn self_correlation_is_one_at_lag_zero() {
        let x = yearly(2014, &[0.1, 0.3, 0.2, 0.5, 0.4, 0.6]);
        let table = CrossCorrelationAnalyzer::new(2).analyze_points(&x, &x, "X", "X");
        assert_relative_eq!(table.get(0).unwrap().correlation().unwrap(), 1.0);
        assert_eq!(table.best().unwrap().lag, 0);
        assert_eq!(table.results.len(), 5);
    }

    #[test]
    fn shifted_series_leads_by_one_year() {
        let x = yearly(2020, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = yearly(2021, &[1.0, 2.0, 3.0, 4.0]);
        let table = CrossCorrelationAnalyzer::new(2).analyze_points(&x, &y, "X", "Y");

        assert_relative_eq!(table.get(1).unwrap().correlation().unwrap(), 1.0);
        assert_eq!(table.get(1).unwrap().sample_size, 4);
        assert_eq!(
            table.get(0).unwrap().outcome,
            CorrelationOutcome::Undefined {
                reason: UndefinedReason::MissingObservations
            }
        );
        assert!(table.get(-2).unwrap().correlation().is_none());

        let best = table.best().unwrap();
        assert_eq!(best.lag, 1);
        assert_eq!(table.best_interpretation().unwrap(), "X leads Y by 1 year");
        assert_eq!(
            IndicatorStrength::classify(best.correlation().unwrap()),
            IndicatorStrength::Strong
        );
    }

    #[test]
    fn lag_wider_than_series_is_insufficient() {
        let x = yearly(2020, &[1.0, 2.0, 3.0, 4.0]);
        let table = CrossCorrelationAnalyzer::new(5).analyze_points(&x, &x, "X", "Y");
        assert_eq!(
            table.get(5).unwrap().outcome,
            CorrelationOutcome::Undefined {
                reason: UndefinedReason::InsufficientOverlap
            }
        );
        assert_eq!(table.get(-2).unwrap().sample_size, 2);
    }

    #[test]
    fn widely_separated_years_are_missing_observations() {
        let x = vec![(0, 1.0), (1, 2.0), (100_000_000, 3.0)];
        let aligned = align(&x, &x);
        assert_eq!(aligned.span(), Some((0, 100_000_000)));
        assert_eq!(aligned.grid_len(), 100_000_001);

        let table = CrossCorrelationAnalyzer::new(1).analyze_points(&x, &x, "X", "Y");
        let zero = table.get(0).unwrap();
        assert_eq!(zero.sample_size, 100_000_001);
        assert_eq!(
            zero.outcome,
            CorrelationOutcome::Undefined {
                reason: UndefinedReason::MissingObservations
            }
        );
        assert!(table.best().is_none());
    }

    #[test]
    fn aligned_series_keeps_gaps_implicit() {
        let aligned = align(&yearly(2020, &[1.0, 2.0]), &yearly(2023, &[5.0]));
        assert_eq!(aligned.span(), Some((2020, 2023)));
        assert_eq!(aligned.grid_len(), 4);
        assert_eq!(aligned.get(2021), (Some(2.0), None));
        assert_eq!(aligned.get(2022), (None, None));
        assert_eq!(align(&[], &[]).span(), None);
    }

    #[test]
    fn negative_lag_means_y_leads() {
        let y = yearly(2010, &[1.0, 4.0, 2.0, 8.0, 5.0, 7.0, 3.0]);
        let x: Vec<(i32, f64)> = y.iter().map(|&(year, v)| (year + 2, v)).collect();
        let table = CrossCorrelationAnalyzer::new(3).analyze_points(&x, &y, "Wine", "Price");
        let best = table.best().unwrap();
        assert_eq!(best.lag, -2);
        assert_eq!(best.direction, LagDirection::Lagging);
        assert_eq!(table.best_interpretation().unwrap(), "Price leads Wine by 2 years");
    }

    #[test]
    fn independent_noise_is_near_zero() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut rng_x = ChaCha8Rng::seed_from_u64(1);
        let mut rng_y = ChaCha8Rng::seed_from_u64(2);
        let x: Vec<f64> = (0..2000).map(|_| normal.sample(&mut rng_x)).collect();
        let y: Vec<f64> = (0..2000).map(|_| normal.sample(&mut rng_y)).collect();
        let r = pearson(&x, &y).correlation().unwrap();
        assert!(r.abs() < 0.1, "r was {r}");
    }

    #[test]
    fn growth_rate_basis_drops_first_year() {
        let series = TimeSeries::observed(
            "A",
            vec![
                SeriesPoint::new(2020, 1.0),
                SeriesPoint::new(2021, 2.0),
                SeriesPoint::new(2022, 3.0),
            ],
        )
        .unwrap();
        assert_eq!(CorrelationBasis::GrowthRates.points(&series).len(), 2);
        assert_eq!(CorrelationBasis::Values.points(&series).len(), 3);
        let analyzer = CrossCorrelationAnalyzer::new(1).with_basis(CorrelationBasis::Values);
        let table = analyzer.analyze(&series, &series, "A", "A");
        assert_relative_eq!(table.get(0).unwrap().correlation().unwrap(), 1.0);
    }

    #[test]
    fn metric_correlation_uses_shared_regions() {
        let x = BTreeMap::from([
            ("A".to_string(), 1.0),
            ("B".to_string(), 2.0),
            ("C".to_string(), 3.0),
            ("D".to_string(), 4.0),
        ]);
        let y = BTreeMap::from([
            ("A".to_string(), 10.0),
            ("B".to_string(), 20.0),
            ("C".to_string(), 30.0),
        ]);
        let m = metric_correlation("x vs y", &x, &y);
        assert_eq!(m.sample_size, 3);
        assert_relative_eq!(m.outcome.correlation().unwrap(), 1.0);

        let two = BTreeMap::from([("A".to_string(), 1.0), ("B".to_string(), 2.0)]);
        assert!(metric_correlation("too few", &two, &two).outcome.correlation().is_none());
    }

    #[test]
    fn lag_profile_averages_defined_results() {
        let x = yearly(2014, &[1.0, 3.0, 2.0, 5.0, 4.0]);
        let neg: Vec<(i32, f64)> = x.iter().map(|&(y, v)| (y, -v)).collect();
        let analyzer = CrossCorrelationAnalyzer::new(2);
        let a = analyzer.analyze_points(&x, &x, "X", "Y");
        let b = analyzer.analyze_points(&x, &neg, "X", "Y");
        let profile = lag_profile([&a, &b]);
        assert_relative_eq!(profile[&0].unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(profile.len(), 5);
    }
}
