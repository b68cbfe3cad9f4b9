//! Compile-time registry of region catalogs.
//!
//! Each entry is an `(id, toml_content)` pair embedded via `include_str!`.
//! Adding a new city requires creating a TOML file in `catalogs/` and adding
//! a corresponding entry here.

use crate::{CatalogError, RegionCatalog};

/// Number of registered catalogs. Enforced by a test.
#[cfg(test)]
const EXPECTED_CATALOG_COUNT: usize = 1;

/// Embedded TOML catalog definitions.
const CATALOG_TOMLS: &[(&str, &str)] = &[("berlin", include_str!("../catalogs/berlin.toml"))];

/// Returns the ids of all registered catalogs.
#[must_use]
pub fn catalog_ids() -> Vec<&'static str> {
    CATALOG_TOMLS.iter().map(|(id, _)| *id).collect()
}

/// Loads and validates the registered catalog with the given id.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownCatalog`] if no catalog is registered
/// under `id`, or the validation error if the embedded TOML is invalid.
pub fn catalog_by_id(id: &str) -> Result<RegionCatalog, CatalogError> {
    let (_, toml_str) = CATALOG_TOMLS
        .iter()
        .find(|(name, _)| *name == id)
        .ok_or_else(|| CatalogError::UnknownCatalog { id: id.to_string() })?;
    parse_catalog_toml(toml_str)
}

/// Parses and validates a catalog from TOML text (e.g. a user-supplied file).
///
/// # Errors
///
/// Returns [`CatalogError`] if the TOML does not parse or the catalog is
/// structurally invalid.
pub fn parse_catalog_toml(toml_str: &str) -> Result<RegionCatalog, CatalogError> {
    RegionCatalog::from_toml(toml_str)
}

/// Returns all registered catalogs.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to validate. Since these are
/// compile-time constants, failures indicate a development error and are
/// caught by the tests below.
#[must_use]
pub fn all_catalogs() -> Vec<RegionCatalog> {
    CATALOG_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            RegionCatalog::from_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to load region catalog '{name}': {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_catalogs() {
        let catalogs = all_catalogs();
        assert_eq!(
            catalogs.len(),
            EXPECTED_CATALOG_COUNT,
            "Expected {EXPECTED_CATALOG_COUNT} catalogs, found {}. \
             Update EXPECTED_CATALOG_COUNT after adding/removing catalogs.",
            catalogs.len()
        );
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for catalog in &all_catalogs() {
            assert!(
                seen.insert(catalog.id().to_string()),
                "Duplicate catalog ID: {}",
                catalog.id()
            );
        }
    }

    #[test]
    fn registry_key_matches_catalog_id() {
        for id in catalog_ids() {
            let catalog = catalog_by_id(id).unwrap();
            assert_eq!(catalog.id(), id);
        }
    }

    #[test]
    fn unknown_catalog_is_an_error() {
        assert!(matches!(
            catalog_by_id("atlantis"),
            Err(CatalogError::UnknownCatalog { .. })
        ));
    }

    #[test]
    fn berlin_catalog_contents() {
        let berlin = catalog_by_id("berlin").unwrap();
        assert_eq!(berlin.regions().len(), 12);
        assert_eq!(berlin.regions()[0].name, "Mitte");
        assert_eq!(berlin.current_year(), 2024);
        assert_eq!(berlin.year_range().start, 2014);
        for region in berlin.regions() {
            assert!(region.area_km2 > 0.0, "{} has no area", region.name);
            assert!(region.population.is_some(), "{} has no population", region.name);
            assert!(
                berlin.growth_profile(&region.name).is_some(),
                "{} has no growth profile",
                region.name
            );
        }
        assert_eq!(berlin.price_profiles().len(), 6);
        for profile in berlin.price_profiles().values() {
            assert_eq!(profile.end_year(), berlin.current_year());
        }
        assert!(berlin.cataloged_area_km2() < berlin.city_area_km2());
    }
}
