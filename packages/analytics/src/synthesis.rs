//! Backward synthesis of a historical series from a present-day value.
//!
//! For a value `V` at year `T`, each earlier year `y` gets
//! `V / (1 + r(y))^(T - y)` where `r(y)` is the profile's base rate scaled
//! by the phase multiplier for `y` and by keyed noise. The result is a
//! [`SyntheticSeries`]: it is a simulation, not an observation.

use std::collections::BTreeMap;

use rayon::prelude::*;
use venue_density_analytics_models::{SeriesPoint, SyntheticSeries};
use venue_density_region_models::{GrowthProfile, YearRange};

use crate::{AnalyticsError, noise};

/// Projects present-day values backward using per-region growth profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalSeriesSynthesizer {
    seed: u64,
}

impl HistoricalSeriesSynthesizer {
    /// Creates a synthesizer with the given global seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The global seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Effective growth rate for `year`: base rate × phase multiplier × noise.
    #[must_use]
    pub fn effective_rate(&self, profile: &GrowthProfile, year: i32) -> f64 {
        profile.base_rate
            * profile.phase_multiplier(year)
            * noise::growth_factor(self.seed, &profile.region, year, profile.volatility)
    }

    /// Synthesizes the series for `years`, ending at `years.end` with
    /// `current_value`.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::InvalidInput`] if `current_value` is negative or
    ///   not finite, or `years` is empty.
    pub fn synthesize(
        &self,
        current_value: f64,
        profile: &GrowthProfile,
        years: YearRange,
    ) -> Result<SyntheticSeries, AnalyticsError> {
        let region = profile.region.as_str();
        if !current_value.is_finite() || current_value < 0.0 {
            return Err(AnalyticsError::InvalidInput {
                region: region.to_string(),
                message: format!("current value {current_value} must be finite and non-negative"),
            });
        }
        if years.is_empty() {
            return Err(AnalyticsError::InvalidInput {
                region: region.to_string(),
                message: format!("empty year range {}..={}", years.start, years.end),
            });
        }

        let points = years
            .years()
            .map(|year| {
                let value = if year == years.end {
                    current_value
                } else {
                    let rate = self.effective_rate(profile, year);
                    let value = current_value / (1.0 + rate).powi(years.end - year);
                    if value.is_finite() { value.max(0.0) } else { 0.0 }
                };
                SeriesPoint::new(year, value)
            })
            .collect();

        Ok(SyntheticSeries::new(region, self.seed, points)?)
    }

    /// Synthesizes every region that has both a current value and a growth
    /// profile, in parallel.
    ///
    /// Regions missing a profile are skipped with a debug log. Per-region
    /// errors are returned alongside the region name.
    #[must_use]
    pub fn synthesize_all(
        &self,
        current_values: &BTreeMap<String, f64>,
        profiles: &BTreeMap<&str, &GrowthProfile>,
        years: YearRange,
    ) -> BTreeMap<String, Result<SyntheticSeries, AnalyticsError>> {
        let jobs: Vec<(&String, f64, &GrowthProfile)> = current_values
            .iter()
            .filter_map(|(region, &value)| {
                let profile = profiles.get(region.as_str());
                if profile.is_none() {
                    log::debug!("No growth profile for '{region}', skipping synthesis");
                }
                profile.map(|&p| (region, value, p))
            })
            .collect();

        jobs.into_par_iter()
            .map(|(region, value, profile)| {
                (region.clone(), self.synthesize(value, profile, years))
            })
            .collect()
    }
}

/// Synthesizes one series with a throwaway synthesizer.
///
/// # Errors
///
/// See [`HistoricalSeriesSynthesizer::synthesize`].
pub fn synthesize(
    current_value: f64,
    profile: &GrowthProfile,
    years: YearRange,
    seed: u64,
) -> Result<SyntheticSeries, AnalyticsError> {
    HistoricalSeriesSynthesizer::new(seed).synthesize(current_value, profile, years)
}

/// Estimated whole-venue counts for a density series, `floor(density × area)`.
///
/// `None` when the area is not positive.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimated_counts(series: &SyntheticSeries, area_km2: f64) -> Option<BTreeMap<i32, u64>> {
    if !(area_km2.is_finite() && area_km2 > 0.0) {
        return None;
    }
    Some(
        series
            .as_series()
            .points()
            .iter()
            .map(|p| (p.year, (p.value * area_km2).floor().max(0.0) as u64))
            .collect(),
    )
}
