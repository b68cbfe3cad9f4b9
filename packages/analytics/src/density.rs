//! Density normalization.
//!
//! Converts per-region venue counts into venues per km² and venues per
//! 100,000 residents. Non-positive areas or populations yield 0 rather
//! than an error.

use std::collections::BTreeMap;

use venue_density_analytics_models::DensityMetrics;
use venue_density_region::RegionCatalog;
use venue_density_region_models::FALLBACK_REGION;
use venue_density_spatial::Assignment;

/// Smallest area the fallback region is given, so that a catalog whose
/// regions cover more than the nominal city area never divides by zero.
pub const MIN_FALLBACK_AREA_KM2: f64 = 1e-6;

/// Venues per km², 0 when `area_km2 <= 0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density_per_km2(count: u64, area_km2: f64) -> f64 {
    if area_km2 > 0.0 {
        count as f64 / area_km2
    } else {
        0.0
    }
}

/// Venues per 100,000 residents, 0 when the population is unknown or 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_capita_per_100k(count: u64, population: Option<u64>) -> f64 {
    match population {
        Some(population) if population > 0 => count as f64 / population as f64 * 100_000.0,
        _ => 0.0,
    }
}

/// Area attributed to the fallback region: whatever part of the city the
/// catalog does not cover, clamped to [`MIN_FALLBACK_AREA_KM2`].
#[must_use]
pub fn fallback_area_km2(catalog: &RegionCatalog) -> f64 {
    (catalog.city_area_km2() - catalog.cataloged_area_km2()).max(MIN_FALLBACK_AREA_KM2)
}

/// Normalizes raw counts per region name.
///
/// Every cataloged region appears in the output (count 0 when absent from
/// `counts`). The fallback region appears only when it has venues.
#[must_use]
pub fn normalize_counts(
    counts: &BTreeMap<String, u64>,
    catalog: &RegionCatalog,
) -> BTreeMap<String, DensityMetrics> {
    let mut metrics: BTreeMap<String, DensityMetrics> = catalog
        .regions()
        .iter()
        .map(|region| {
            let count = counts.get(&region.name).copied().unwrap_or(0);
            let m = DensityMetrics {
                region: region.name.clone(),
                count,
                area_km2: region.area_km2,
                population: region.population,
                density_per_km2: density_per_km2(count, region.area_km2),
                per_capita_per_100k: per_capita_per_100k(count, region.population),
            };
            (region.name.clone(), m)
        })
        .collect();

    if let Some(&count) = counts.get(FALLBACK_REGION)
        && count > 0
    {
        let area_km2 = fallback_area_km2(catalog);
        let population = catalog.other_population();
        metrics.insert(
            FALLBACK_REGION.to_string(),
            DensityMetrics {
                region: FALLBACK_REGION.to_string(),
                count,
                area_km2,
                population,
                density_per_km2: density_per_km2(count, area_km2),
                per_capita_per_100k: per_capita_per_100k(count, population),
            },
        );
    }

    for name in counts.keys() {
        if name != FALLBACK_REGION && catalog.region(name).is_none() {
            log::warn!("Ignoring count for region '{name}' not in catalog '{}'", catalog.id());
        }
    }

    metrics
}

/// Normalizes an assignment against the catalog it was produced from.
#[must_use]
pub fn normalize(
    assignment: &Assignment,
    catalog: &RegionCatalog,
) -> BTreeMap<String, DensityMetrics> {
    normalize_counts(&assignment.counts(), catalog)
}

/// Orders metrics by density (highest first), then by region name.
#[must_use]
pub fn rank_by_density(metrics: &BTreeMap<String, DensityMetrics>) -> Vec<DensityMetrics> {
    let mut ranked: Vec<DensityMetrics> = metrics.values().cloned().collect();
    ranked.sort_by(|a, b| {
        b.density_per_km2
            .total_cmp(&a.density_per_km2)
            .then_with(|| a.region.cmp(&b.region))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use venue_density_spatial::assign;
    use venue_density_venue_models::Venue;

    fn catalog(city_area: f64) -> RegionCatalog {
        RegionCatalog::from_toml(&format!(
            r#"
            id = "t"
            name = "t"
            city_area_km2 = {city_area}
            other_population = 5000
            current_year = 2024
            history_years = 3

            [[regions]]
            name = "A"
            bounds = {{ lat_min = 0.0, lat_max = 1.0, lon_min = 0.0, lon_max = 1.0 }}
            area_km2 = 10.0
            population = 200000

            [[regions]]
            name = "B"
            bounds = {{ lat_min = 2.0, lat_max = 3.0, lon_min = 2.0, lon_max = 3.0 }}
            area_km2 = 0.0
            "#
        ))
        .unwrap()
    }

    #[test]
    fn five_venues_in_ten_km2() {
        let catalog = catalog(100.0);
        let venues: Vec<_> = (0..5)
            .map(|i| Venue::new(format!("v{i}"), "v", 0.5, 0.5))
            .collect();
        let assignment = assign(&venues, catalog.regions());
        let metrics = normalize(&assignment, &catalog);

        let a = &metrics["A"];
        assert_eq!(a.count, 5);
        assert_relative_eq!(a.density_per_km2, 0.5);
        assert_relative_eq!(a.per_capita_per_100k, 2.5);
    }

    #[test]
    fn zero_count_means_zero_density() {
        let metrics = normalize_counts(&BTreeMap::new(), &catalog(100.0));
        assert_eq!(metrics["A"].count, 0);
        assert!(metrics["A"].density_per_km2.abs() < f64::EPSILON);
        assert!(!metrics.contains_key(FALLBACK_REGION));
    }

    #[test]
    fn non_positive_area_and_population_guard_to_zero() {
        let counts = BTreeMap::from([("B".to_string(), 4)]);
        let metrics = normalize_counts(&counts, &catalog(100.0));
        assert_eq!(metrics["B"].count, 4);
        assert!(metrics["B"].density_per_km2.abs() < f64::EPSILON);
        assert!(metrics["B"].per_capita_per_100k.abs() < f64::EPSILON);
        assert!(per_capita_per_100k(3, Some(0)).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_uses_remaining_city_area() {
        let counts = BTreeMap::from([(FALLBACK_REGION.to_string(), 9)]);
        let metrics = normalize_counts(&counts, &catalog(100.0));
        let other = &metrics[FALLBACK_REGION];
        assert_relative_eq!(other.area_km2, 90.0);
        assert_relative_eq!(other.density_per_km2, 0.1);
        assert_relative_eq!(other.per_capita_per_100k, 180.0);
    }

    #[test]
    fn fallback_area_is_clamped_when_catalog_exceeds_city() {
        let catalog = catalog(5.0);
        assert_relative_eq!(fallback_area_km2(&catalog), MIN_FALLBACK_AREA_KM2);
        let counts = BTreeMap::from([(FALLBACK_REGION.to_string(), 1)]);
        let metrics = normalize_counts(&counts, &catalog);
        assert!(metrics[FALLBACK_REGION].density_per_km2.is_finite());
    }

    #[test]
    fn ranking_orders_by_density_then_name() {
        let counts = BTreeMap::from([("A".to_string(), 1), (FALLBACK_REGION.to_string(), 90)]);
        let ranked = rank_by_density(&normalize_counts(&counts, &catalog(100.0)));
        let names: Vec<_> = ranked.iter().map(|m| m.region.as_str()).collect();
        assert_eq!(names, vec![FALLBACK_REGION, "A", "B"]);
    }
}
