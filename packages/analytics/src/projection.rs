//! Forward price projection from an annual appreciation table.
//!
//! Starting at `base_price` in `base_year`, each year's price is the
//! previous year's times `1 + max(0, rate + noise)`. The last year carries
//! no rate of its own. The output is synthetic like any other simulated
//! series.

use venue_density_analytics_models::{SeriesPoint, SyntheticSeries};
use venue_density_region_models::PriceProfile;

use crate::{AnalyticsError, noise};

/// Appreciation rate applied from `year` to `year + 1`, floored at 0.
#[must_use]
pub fn annual_rate(profile: &PriceProfile, index: usize, seed: u64) -> Option<f64> {
    let rate = *profile.annual_rates.get(index)?;
    let year = profile.base_year + i32::try_from(index).ok()?;
    Some((rate + noise::price_offset(seed, &profile.region, year, profile.volatility)).max(0.0))
}

/// Projects a price series over `base_year..=end_year()`.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidInput`] if the profile has no rates or
/// its base price is negative or not finite.
pub fn project(profile: &PriceProfile, seed: u64) -> Result<SyntheticSeries, AnalyticsError> {
    if !profile.base_price.is_finite() || profile.base_price < 0.0 {
        return Err(AnalyticsError::InvalidInput {
            region: profile.region.clone(),
            message: format!("base price {} must be finite and non-negative", profile.base_price),
        });
    }
    if profile.annual_rates.is_empty() {
        return Err(AnalyticsError::InvalidInput {
            region: profile.region.clone(),
            message: "no annual rates".to_string(),
        });
    }

    let mut price = profile.base_price;
    let mut year = profile.base_year;
    let mut points = Vec::with_capacity(profile.annual_rates.len() + 1);
    points.push(SeriesPoint::new(year, price));

    for index in 0..profile.annual_rates.len() {
        let rate = annual_rate(profile, index, seed).unwrap_or(0.0);
        price *= 1.0 + rate;
        if !price.is_finite() {
            return Err(AnalyticsError::InvalidInput {
                region: profile.region.clone(),
                message: format!("price overflowed after {year}"),
            });
        }
        year += 1;
        points.push(SeriesPoint::new(year, price));
    }

    Ok(SyntheticSeries::new(&profile.region, seed, points)?)
}
