//! Validated region catalog.

use std::collections::{BTreeMap, BTreeSet};

use venue_density_region_models::{
    CatalogDefinition, FALLBACK_REGION, GrowthProfile, PriceProfile, Region, YearRange,
};

use crate::CatalogError;

/// A validated region catalog.
///
/// Region declaration order is part of the contract: when bounding boxes
/// overlap, the region declared first claims the point.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    id: String,
    name: String,
    city_area_km2: f64,
    other_population: Option<u64>,
    current_year: i32,
    history_years: u32,
    regions: Vec<Region>,
    growth_profiles: BTreeMap<String, GrowthProfile>,
    price_profiles: BTreeMap<String, PriceProfile>,
}

impl RegionCatalog {
    /// Parses and validates a catalog from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the TOML is malformed or the catalog
    /// fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, CatalogError> {
        let definition: CatalogDefinition = toml::from_str(toml_str)?;
        Self::from_definition(definition)
    }

    /// Validates a deserialized catalog definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] describing the first structural problem
    /// found.
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let CatalogDefinition {
            id,
            name,
            city_area_km2,
            other_population,
            current_year,
            history_years,
            regions,
            growth_profiles,
            price_profiles,
        } = definition;

        if regions.is_empty() {
            return Err(CatalogError::Empty { catalog: id });
        }
        if !city_area_km2.is_finite() || city_area_km2 <= 0.0 {
            return Err(CatalogError::InvalidValue {
                name: id,
                field: "city_area_km2",
                value: city_area_km2,
            });
        }

        let mut names = BTreeSet::new();
        for region in &regions {
            validate_region(region)?;
            if !names.insert(region.name.as_str()) {
                return Err(CatalogError::DuplicateRegion {
                    name: region.name.clone(),
                });
            }
        }

        let mut growth = BTreeMap::new();
        for profile in growth_profiles {
            validate_growth_profile(&profile, &names)?;
            if growth.contains_key(&profile.region) {
                return Err(CatalogError::DuplicateProfile {
                    kind: "growth",
                    region: profile.region,
                });
            }
            growth.insert(profile.region.clone(), profile);
        }

        let years = YearRange::trailing(current_year, history_years);
        let mut prices = BTreeMap::new();
        for profile in price_profiles {
            validate_price_profile(&profile, &names, years)?;
            if prices.contains_key(&profile.region) {
                return Err(CatalogError::DuplicateProfile {
                    kind: "price",
                    region: profile.region,
                });
            }
            prices.insert(profile.region.clone(), profile);
        }

        let catalog = Self {
            id,
            name,
            city_area_km2,
            other_population,
            current_year,
            history_years,
            regions,
            growth_profiles: growth,
            price_profiles: prices,
        };

        if catalog.cataloged_area_km2() > catalog.city_area_km2 {
            log::warn!(
                "Catalog '{}': cataloged area {:.1} km² exceeds city area {:.1} km²",
                catalog.id,
                catalog.cataloged_area_km2(),
                catalog.city_area_km2
            );
        }

        log::debug!(
            "Loaded catalog '{}' with {} regions, {} growth profiles, {} price profiles",
            catalog.id,
            catalog.regions.len(),
            catalog.growth_profiles.len(),
            catalog.price_profiles.len()
        );

        Ok(catalog)
    }

    /// Catalog identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable catalog name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Regions in declaration order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Looks up a region by name.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Growth profile for a region, if configured.
    #[must_use]
    pub fn growth_profile(&self, region: &str) -> Option<&GrowthProfile> {
        self.growth_profiles.get(region)
    }

    /// Price profile for a region, if configured.
    #[must_use]
    pub fn price_profile(&self, region: &str) -> Option<&PriceProfile> {
        self.price_profiles.get(region)
    }

    /// All price profiles keyed by region name.
    #[must_use]
    pub const fn price_profiles(&self) -> &BTreeMap<String, PriceProfile> {
        &self.price_profiles
    }

    /// Total city area in km².
    #[must_use]
    pub const fn city_area_km2(&self) -> f64 {
        self.city_area_km2
    }

    /// Population living outside the cataloged regions.
    #[must_use]
    pub const fn other_population(&self) -> Option<u64> {
        self.other_population
    }

    /// Sum of the cataloged regions' areas (non-positive areas count as 0).
    #[must_use]
    pub fn cataloged_area_km2(&self) -> f64 {
        self.regions.iter().map(|r| r.area_km2.max(0.0)).sum()
    }

    /// Present-day year of the entity snapshot.
    #[must_use]
    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Years covered by historical synthesis, ending at the current year.
    #[must_use]
    pub const fn year_range(&self) -> YearRange {
        YearRange::trailing(self.current_year, self.history_years)
    }
}

fn validate_region(region: &Region) -> Result<(), CatalogError> {
    if region.name == FALLBACK_REGION {
        return Err(CatalogError::ReservedName {
            name: region.name.clone(),
        });
    }
    if !region.bounds.is_well_formed() {
        return Err(CatalogError::MalformedBounds {
            name: region.name.clone(),
        });
    }
    if !region.area_km2.is_finite() {
        return Err(CatalogError::InvalidValue {
            name: region.name.clone(),
            field: "area_km2",
            value: region.area_km2,
        });
    }
    if region.area_km2 <= 0.0 {
        // Allowed: density for this region is reported as 0.
        log::warn!(
            "Region '{}' has non-positive area {}; its density will be 0",
            region.name,
            region.area_km2
        );
    }
    Ok(())
}

fn validate_growth_profile(
    profile: &GrowthProfile,
    names: &BTreeSet<&str>,
) -> Result<(), CatalogError> {
    if !names.contains(profile.region.as_str()) {
        return Err(CatalogError::UnknownRegion {
            kind: "Growth",
            region: profile.region.clone(),
        });
    }
    if !profile.base_rate.is_finite() {
        return Err(CatalogError::InvalidValue {
            name: profile.region.clone(),
            field: "base_rate",
            value: profile.base_rate,
        });
    }
    if !profile.volatility.is_finite() || profile.volatility < 0.0 {
        return Err(CatalogError::InvalidValue {
            name: profile.region.clone(),
            field: "volatility",
            value: profile.volatility,
        });
    }
    for phase in &profile.phases {
        if phase.start_year > phase.end_year {
            return Err(CatalogError::InvertedPhase {
                region: profile.region.clone(),
                start_year: phase.start_year,
                end_year: phase.end_year,
            });
        }
        if !phase.multiplier.is_finite() {
            return Err(CatalogError::InvalidValue {
                name: profile.region.clone(),
                field: "multiplier",
                value: phase.multiplier,
            });
        }
    }
    Ok(())
}

fn validate_price_profile(
    profile: &PriceProfile,
    names: &BTreeSet<&str>,
    years: YearRange,
) -> Result<(), CatalogError> {
    if !names.contains(profile.region.as_str()) {
        return Err(CatalogError::UnknownRegion {
            kind: "Price",
            region: profile.region.clone(),
        });
    }
    if !profile.base_price.is_finite() || profile.base_price < 0.0 {
        return Err(CatalogError::InvalidValue {
            name: profile.region.clone(),
            field: "base_price",
            value: profile.base_price,
        });
    }
    if !profile.volatility.is_finite() || profile.volatility < 0.0 {
        return Err(CatalogError::InvalidValue {
            name: profile.region.clone(),
            field: "volatility",
            value: profile.volatility,
        });
    }
    if let Some(rate) = profile.annual_rates.iter().find(|r| !r.is_finite()) {
        return Err(CatalogError::InvalidValue {
            name: profile.region.clone(),
            field: "annual_rates",
            value: *rate,
        });
    }
    if profile.base_year != years.start || profile.end_year() != years.end {
        return Err(CatalogError::PriceSpanMismatch {
            region: profile.region.clone(),
            start_year: profile.base_year,
            end_year: profile.end_year(),
            expected_start: years.start,
            expected_end: years.end,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        id = "test"
        name = "Test city"
        city_area_km2 = 100.0
        current_year = 2024
        history_years = 3

        [[regions]]
        name = "A"
        bounds = { lat_min = 0.0, lat_max = 1.0, lon_min = 0.0, lon_max = 1.0 }
        area_km2 = 10.0
        population = 1000

        [[regions]]
        name = "B"
        bounds = { lat_min = 0.5, lat_max = 2.0, lon_min = 0.5, lon_max = 2.0 }
        area_km2 = 20.0

        [[growth_profiles]]
        region = "A"
        base_rate = 0.1
    "#;

    #[test]
    fn parses_minimal_catalog() {
        let catalog = RegionCatalog::from_toml(MINIMAL).unwrap();
        assert_eq!(catalog.id(), "test");
        let names: Vec<_> = catalog.regions().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"], "declaration order must be preserved");
        assert!((catalog.cataloged_area_km2() - 30.0).abs() < 1e-12);
        assert_eq!(catalog.year_range(), YearRange { start: 2021, end: 2024 });
        assert!(catalog.growth_profile("A").is_some());
        assert!(catalog.growth_profile("B").is_none());
        assert_eq!(catalog.region("B").unwrap().population, None);
    }

    #[test]
    fn rejects_duplicate_region() {
        let toml = MINIMAL.replace("name = \"B\"", "name = \"A\"");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::DuplicateRegion { name }) if name == "A"
        ));
    }

    #[test]
    fn rejects_reserved_fallback_name() {
        let toml = MINIMAL.replace("name = \"B\"", "name = \"Other\"");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::ReservedName { .. })
        ));
    }

    #[test]
    fn rejects_profile_for_unknown_region() {
        let toml = MINIMAL.replace("region = \"A\"", "region = \"Z\"");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::UnknownRegion { kind: "Growth", region }) if region == "Z"
        ));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let toml = MINIMAL.replace("lat_min = 0.5, lat_max = 2.0", "lat_min = 2.5, lat_max = 2.0");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::MalformedBounds { name }) if name == "B"
        ));
    }

    #[test]
    fn rejects_negative_volatility() {
        let toml = format!("{MINIMAL}\nvolatility = -0.1\n");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::InvalidValue { field: "volatility", .. })
        ));
    }

    #[test]
    fn allows_non_positive_area() {
        let toml = MINIMAL.replace("area_km2 = 20.0", "area_km2 = 0.0");
        let catalog = RegionCatalog::from_toml(&toml).unwrap();
        assert!((catalog.region("B").unwrap().area_km2).abs() < f64::EPSILON);
    }

    const PRICED: &str = r#"
        [[price_profiles]]
        region = "A"
        base_year = 2021
        base_price = 1000.0
        annual_rates = [0.05, 0.05, 0.05]
    "#;

    #[test]
    fn accepts_price_profile_spanning_history() {
        let catalog = RegionCatalog::from_toml(&format!("{MINIMAL}{PRICED}")).unwrap();
        assert_eq!(catalog.price_profile("A").unwrap().end_year(), 2024);
    }

    #[test]
    fn rejects_price_profile_ending_before_current_year() {
        let toml = format!("{MINIMAL}{PRICED}").replace("[0.05, 0.05, 0.05]", "[0.05, 0.05]");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::PriceSpanMismatch {
                region,
                end_year: 2023,
                expected_end: 2024,
                ..
            }) if region == "A"
        ));
    }

    #[test]
    fn rejects_price_profile_starting_before_history() {
        let toml = format!("{MINIMAL}{PRICED}")
            .replace("base_year = 2021", "base_year = 2020")
            .replace("[0.05, 0.05, 0.05]", "[0.05, 0.05, 0.05, 0.05]");
        assert!(matches!(
            RegionCatalog::from_toml(&toml),
            Err(CatalogError::PriceSpanMismatch { start_year: 2020, expected_start: 2021, .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            RegionCatalog::from_toml("id = "),
            Err(CatalogError::Toml(_))
        ));
    }
}
