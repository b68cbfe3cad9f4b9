#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region catalogs: embedded TOML definitions and their validation.
//!
//! A [`RegionCatalog`] is the validated, read-only form of a
//! [`CatalogDefinition`]. Every structural problem in a catalog (duplicate
//! names, inverted boxes, profiles for unknown regions) is reported as a
//! [`CatalogError`] before any analysis runs.

pub mod catalog;
pub mod registry;

pub use catalog::RegionCatalog;

use thiserror::Error;

/// Fatal configuration errors found while loading a region catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The TOML document could not be parsed.
    #[error("Failed to parse catalog TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// No catalog with the requested id is registered.
    #[error("Unknown catalog '{id}'")]
    UnknownCatalog {
        /// The requested id.
        id: String,
    },

    /// The catalog declares no regions.
    #[error("Catalog '{catalog}' declares no regions")]
    Empty {
        /// Catalog id.
        catalog: String,
    },

    /// Two regions share a name.
    #[error("Duplicate region name '{name}'")]
    DuplicateRegion {
        /// The repeated name.
        name: String,
    },

    /// A region uses the name reserved for the fallback bucket.
    #[error("Region name '{name}' is reserved for unmatched entities")]
    ReservedName {
        /// The reserved name.
        name: String,
    },

    /// A region's bounding box is inverted or has non-finite edges.
    #[error("Region '{name}' has a malformed bounding box")]
    MalformedBounds {
        /// Region name.
        name: String,
    },

    /// A numeric field is out of its allowed domain.
    #[error("Invalid value for {field} in '{name}': {value}")]
    InvalidValue {
        /// Region, profile or catalog the value belongs to.
        name: String,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A profile refers to a region the catalog does not declare.
    #[error("{kind} profile refers to unknown region '{region}'")]
    UnknownRegion {
        /// `"Growth"` or `"Price"`.
        kind: &'static str,
        /// The unknown region name.
        region: String,
    },

    /// A region has more than one profile of the same kind.
    #[error("Region '{region}' has more than one {kind} profile")]
    DuplicateProfile {
        /// `"growth"` or `"price"`.
        kind: &'static str,
        /// Region name.
        region: String,
    },

    /// A growth phase window ends before it starts.
    #[error("Growth phase {start_year}..={end_year} for '{region}' is inverted")]
    InvertedPhase {
        /// Region name.
        region: String,
        /// Phase start.
        start_year: i32,
        /// Phase end.
        end_year: i32,
    },

    /// A price projection does not span the catalog's history years.
    #[error(
        "Price profile for '{region}' spans {start_year}..={end_year}, \
         expected {expected_start}..={expected_end}"
    )]
    PriceSpanMismatch {
        /// Region name.
        region: String,
        /// Profile base year.
        start_year: i32,
        /// Last projected year.
        end_year: i32,
        /// First history year.
        expected_start: i32,
        /// Current year.
        expected_end: i32,
    },
}
