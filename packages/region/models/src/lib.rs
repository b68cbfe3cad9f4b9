#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region catalog types.
//!
//! Defines the TOML schema for a city's region catalog (regions, growth
//! profiles, price profiles) and the plain data types the analytics engine
//! consumes. Regions are axis-aligned bounding boxes, not true polygons.

use serde::{Deserialize, Serialize};

/// Label for entities that fall inside no cataloged region.
pub const FALLBACK_REGION: &str = "Other";

/// An axis-aligned latitude/longitude box. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
    /// Western edge.
    pub lon_min: f64,
    /// Eastern edge.
    pub lon_max: f64,
}

impl BoundingBox {
    /// Whether the point lies inside the box or on its edge.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }

    /// Whether all four edges are finite and `min <= max` on both axes.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite())
            && self.lat_min <= self.lat_max
            && self.lon_min <= self.lon_max
    }

    /// Center point as `(lat, lon)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::midpoint(self.lat_min, self.lat_max),
            f64::midpoint(self.lon_min, self.lon_max),
        )
    }
}

/// A cataloged administrative region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique region name (e.g. `"Kreuzberg"`).
    pub name: String,
    /// Inclusive bounding box.
    pub bounds: BoundingBox,
    /// Land area in km².
    pub area_km2: f64,
    /// Resident population, when known.
    #[serde(default)]
    pub population: Option<u64>,
    /// Short human-readable description for reports.
    #[serde(default)]
    pub description: Option<String>,
}

/// A window of years during which a growth multiplier applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthPhase {
    /// First year of the window (inclusive).
    pub start_year: i32,
    /// Last year of the window (inclusive).
    pub end_year: i32,
    /// Multiplier applied to the base rate inside the window.
    pub multiplier: f64,
}

impl GrowthPhase {
    /// Whether `year` falls inside this phase window.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        self.start_year <= year && year <= self.end_year
    }
}

/// Per-region configuration for backward series synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthProfile {
    /// Region this profile applies to.
    pub region: String,
    /// Base annual growth rate (0.08 = 8%).
    pub base_rate: f64,
    /// Standard deviation of the multiplicative noise around 1.0.
    #[serde(default)]
    pub volatility: f64,
    /// Free-form growth pattern label (e.g. `"explosive_recent"`).
    #[serde(default)]
    pub pattern: Option<String>,
    /// Ordered phase windows. The first window containing a year wins.
    #[serde(default)]
    pub phases: Vec<GrowthPhase>,
}

impl GrowthProfile {
    /// Creates a profile with no phases and no noise.
    #[must_use]
    pub fn flat(region: impl Into<String>, base_rate: f64) -> Self {
        Self {
            region: region.into(),
            base_rate,
            volatility: 0.0,
            pattern: None,
            phases: Vec::new(),
        }
    }

    /// Multiplier for `year`: the first phase containing it, else 1.0.
    #[must_use]
    pub fn phase_multiplier(&self, year: i32) -> f64 {
        self.phases
            .iter()
            .find(|phase| phase.contains(year))
            .map_or(1.0, |phase| phase.multiplier)
    }
}

/// Per-region configuration for forward price projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceProfile {
    /// Region this profile applies to.
    pub region: String,
    /// Year of `base_price`.
    pub base_year: i32,
    /// Price per m² in the base year.
    pub base_price: f64,
    /// Annual appreciation rate for each year starting at `base_year`.
    pub annual_rates: Vec<f64>,
    /// Noise scale. The per-year perturbation has standard deviation
    /// `volatility / 10`.
    #[serde(default)]
    pub volatility: f64,
}

impl PriceProfile {
    /// Last year covered by the projection.
    #[must_use]
    pub fn end_year(&self) -> i32 {
        let span = i32::try_from(self.annual_rates.len()).unwrap_or(i32::MAX);
        self.base_year.saturating_add(span)
    }
}

/// An inclusive span of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    /// First year (inclusive).
    pub start: i32,
    /// Last year (inclusive). For backward synthesis this is the present year.
    pub end: i32,
}

impl YearRange {
    /// Creates a range, returning `None` when `start > end`.
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// The `history_years` years leading up to and including `end`.
    #[must_use]
    pub const fn trailing(end: i32, history_years: u32) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        let back = history_years as i32;
        Self {
            start: end.saturating_sub(back),
            end,
        }
    }

    /// Number of years in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.end < self.start {
            return 0;
        }
        #[allow(clippy::cast_sign_loss)]
        let len = (self.end - self.start) as usize + 1;
        len
    }

    /// Whether the range holds no years (only possible when constructed
    /// with `start > end` directly).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Iterates the years in ascending order.
    #[must_use]
    pub const fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start..=self.end
    }
}

/// A region catalog document as deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDefinition {
    /// Unique catalog identifier (e.g. `"berlin"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Total city area in km², used to size the fallback region.
    pub city_area_km2: f64,
    /// Population outside the cataloged regions, if known.
    #[serde(default)]
    pub other_population: Option<u64>,
    /// The present-day year of the entity snapshot.
    pub current_year: i32,
    /// How many years back the historical synthesis reaches.
    pub history_years: u32,
    /// Regions in declaration order. Order decides overlap resolution.
    pub regions: Vec<Region>,
    /// Backward synthesis profiles.
    #[serde(default)]
    pub growth_profiles: Vec<GrowthProfile>,
    /// Forward price projection profiles.
    #[serde(default)]
    pub price_profiles: Vec<PriceProfile>,
}
