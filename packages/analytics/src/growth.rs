//! Growth statistics over a yearly series.

use std::collections::BTreeMap;

use rayon::prelude::*;
use venue_density_analytics_models::{GrowthSummary, TimeSeries};

use crate::AnalyticsError;

/// Relative change from `start` to `end`.
///
/// `1.0` when growing from zero, `0.0` when both are zero.
#[must_use]
pub fn total_growth(start: f64, end: f64) -> f64 {
    if start > 0.0 {
        (end - start) / start
    } else if end > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Compound annual growth rate over `years`, with the same zero guard as
/// [`total_growth`].
#[must_use]
pub fn cagr(start: f64, end: f64, years: i32) -> f64 {
    if years <= 0 {
        return 0.0;
    }
    if start > 0.0 {
        (end / start).powf(1.0 / f64::from(years)) - 1.0
    } else if end > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (ddof = 1), `None` with fewer than two values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// The `(year, rate)` with the highest rate; the earliest year wins ties.
#[must_use]
pub fn peak(rates: &[(i32, f64)]) -> Option<(i32, f64)> {
    rates.iter().copied().fold(None, |best, (year, rate)| match best {
        Some((_, best_rate)) if rate <= best_rate => best,
        _ => Some((year, rate)),
    })
}

/// Summarizes a series.
///
/// # Errors
///
/// Returns [`AnalyticsError::InsufficientData`] if the series has fewer
/// than two points.
pub fn summarize(series: &TimeSeries) -> Result<GrowthSummary, AnalyticsError> {
    let points = series.points();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Err(insufficient(series));
    };
    if points.len() < 2 {
        return Err(insufficient(series));
    }

    let rate_points = series.rate_points();
    let rates: Vec<f64> = rate_points.iter().map(|&(_, r)| r).collect();
    let (peak_year, peak_rate) = peak(&rate_points).ok_or_else(|| insufficient(series))?;

    Ok(GrowthSummary {
        region: series.region().to_string(),
        start_year: first.year,
        end_year: last.year,
        start_value: first.value,
        end_value: last.value,
        total_growth: total_growth(first.value, last.value),
        cagr: cagr(first.value, last.value, last.year - first.year),
        avg_yoy: mean(&rates).unwrap_or(0.0),
        volatility: sample_std_dev(&rates),
        peak_year,
        peak_rate,
    })
}

/// Summarizes many series in parallel, keyed by region.
#[must_use]
pub fn summarize_all<'a, I>(series: I) -> BTreeMap<String, Result<GrowthSummary, AnalyticsError>>
where
    I: IntoIterator<Item = &'a TimeSeries>,
{
    let series: Vec<&TimeSeries> = series.into_iter().collect();
    series
        .into_par_iter()
        .map(|s| (s.region().to_string(), summarize(s)))
        .collect()
}

fn insufficient(series: &TimeSeries) -> AnalyticsError {
    AnalyticsError::InsufficientData {
        region: series.region().to_string(),
        points: series.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;
    use venue_density_analytics_models::SeriesPoint;
    use venue_density_region_models::{GrowthProfile, YearRange};

    use crate::synthesis;

    fn series(values: &[(i32, f64)]) -> TimeSeries {
        TimeSeries::observed(
            "R",
            values.iter().map(|&(y, v)| SeriesPoint::new(y, v)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn ten_percent_compound_growth() {
        let s = series(&[
            (2021, 0.5 / 1.331),
            (2022, 0.5 / 1.21),
            (2023, 0.5 / 1.1),
            (2024, 0.5),
        ]);
        let summary = summarize(&s).unwrap();
        assert_relative_eq!(summary.cagr, 0.10, epsilon = 1e-9);
        assert_relative_eq!(summary.avg_yoy, 0.10, epsilon = 1e-9);
        assert_relative_eq!(summary.total_growth, 0.331, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.volatility.unwrap(), 0.0, epsilon = 1e-9);
        assert_eq!(summary.start_year, 2021);
        assert_eq!(summary.end_year, 2024);
    }

    #[test]
    fn synthesized_history_recovers_its_growth_rate() {
        let years = YearRange::new(2021, 2024).unwrap();
        let profile = GrowthProfile::flat("A", 0.10);
        let series = synthesis::synthesize(0.5, &profile, years, 42).unwrap();
        assert_relative_eq!(series.as_series().value_at(2021).unwrap(), 0.3757, epsilon = 1e-4);

        let summary = summarize(series.as_series()).unwrap();
        assert_relative_eq!(summary.cagr, 0.10, epsilon = 1e-9);
        assert_relative_eq!(summary.end_value, 0.5);
        assert_eq!(summary.region, "A");
    }

    #[test]
    fn needs_two_points() {
        let err = summarize(&series(&[(2024, 1.0)])).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::InsufficientData {
                region: "R".to_string(),
                points: 1
            }
        );
        assert!(summarize(&series(&[])).is_err());
    }

    #[test]
    fn single_rate_has_no_volatility() {
        let summary = summarize(&series(&[(2023, 1.0), (2024, 2.0)])).unwrap();
        assert!(summary.volatility.is_none());
        assert_relative_eq!(summary.avg_yoy, 1.0);
    }

    #[test]
    fn zero_start_guards() {
        let summary = summarize(&series(&[(2022, 0.0), (2023, 0.0), (2024, 3.0)])).unwrap();
        assert_relative_eq!(summary.total_growth, 1.0);
        assert_relative_eq!(summary.cagr, 1.0);
        let flat = summarize(&series(&[(2022, 0.0), (2024, 0.0)])).unwrap();
        assert_abs_diff_eq!(flat.total_growth, 0.0);
        assert_abs_diff_eq!(flat.cagr, 0.0);
    }

    #[test]
    fn peak_ties_go_to_earliest_year() {
        let s = series(&[(2020, 1.0), (2021, 2.0), (2022, 1.0), (2023, 2.0)]);
        let summary = summarize(&s).unwrap();
        assert_eq!(summary.peak_year, 2021);
        assert_relative_eq!(summary.peak_rate, 1.0);
    }

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        assert_relative_eq!(
            sample_std_dev(&[1.0, 2.0, 3.0, 4.0]).unwrap(),
            (5.0_f64 / 3.0).sqrt()
        );
        assert!(sample_std_dev(&[1.0]).is_none());
    }

    #[test]
    fn summarize_all_keys_by_region() {
        let a = TimeSeries::observed(
            "A",
            vec![SeriesPoint::new(2023, 1.0), SeriesPoint::new(2024, 2.0)],
        )
        .unwrap();
        let b = TimeSeries::observed("B", vec![SeriesPoint::new(2024, 2.0)]).unwrap();
        let out = summarize_all([&a, &b]);
        assert!(out["A"].is_ok());
        assert!(matches!(out["B"], Err(AnalyticsError::InsufficientData { points: 1, .. })));
    }

    proptest! {
        #[test]
        fn strictly_increasing_series_has_positive_growth(
            start in 0.01f64..1000.0,
            steps in prop::collection::vec(0.001f64..1.0, 1..15),
        ) {
            let mut value = start;
            let mut points = vec![(2000, value)];
            for (year, step) in (2001..).zip(&steps) {
                value *= 1.0 + step;
                points.push((year, value));
            }

            let summary = summarize(&series(&points)).unwrap();
            prop_assert!(summary.total_growth > 0.0);
            prop_assert!(summary.cagr > 0.0);
            prop_assert!(summary.avg_yoy > 0.0);
        }
    }
}
