#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for region attribution.
//!
//! Builds an R-tree over the catalog's region bounding boxes and assigns
//! each venue to exactly one region. Regions may overlap; the region
//! declared first in the catalog wins. Venues outside every box fall back
//! to [`FALLBACK_REGION`].

use std::collections::BTreeMap;

use rayon::prelude::*;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use venue_density_region::RegionCatalog;
use venue_density_region_models::{FALLBACK_REGION, Region};
use venue_density_venue_models::Venue;

/// A region bounding box stored in the R-tree with its catalog position.
struct RegionEntry {
    catalog_index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Why a venue was excluded before assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Latitude or longitude absent.
    MissingCoordinate,
    /// Latitude or longitude is NaN or infinite.
    NonFiniteCoordinate,
    /// Outside `[-90, 90]` latitude or `[-180, 180]` longitude.
    OutOfRange,
}

/// A venue excluded from assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedVenue {
    /// Venue identifier.
    pub venue_id: String,
    /// Why it was dropped.
    pub reason: DropReason,
}

/// One venue's region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedVenue {
    /// Venue identifier.
    pub venue_id: String,
    /// Cataloged region name, or [`FALLBACK_REGION`].
    pub region: String,
}

/// Result of assigning a batch of venues to regions.
///
/// Derived per run; never stored on the venues themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Valid venues with their region, in input order.
    pub assigned: Vec<AssignedVenue>,
    /// Venues excluded for invalid coordinates, in input order.
    pub dropped: Vec<DroppedVenue>,
}

impl Assignment {
    /// Venue id -> region name.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<&str, &str> {
        self.assigned
            .iter()
            .map(|a| (a.venue_id.as_str(), a.region.as_str()))
            .collect()
    }

    /// Region assigned to a venue id, if the venue was assigned.
    #[must_use]
    pub fn region_of(&self, venue_id: &str) -> Option<&str> {
        self.assigned
            .iter()
            .find(|a| a.venue_id == venue_id)
            .map(|a| a.region.as_str())
    }

    /// Number of venues per region name (only regions with at least one
    /// venue appear).
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for a in &self.assigned {
            *counts.entry(a.region.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of venues that fell back to [`FALLBACK_REGION`].
    #[must_use]
    pub fn fallback_count(&self) -> u64 {
        self.assigned
            .iter()
            .filter(|a| a.region == FALLBACK_REGION)
            .count() as u64
    }
}

/// Pre-built spatial index over a catalog's region boxes.
///
/// Constructed once per catalog and shared read-only across threads.
pub struct RegionAssigner {
    tree: RTree<RegionEntry>,
    names: Vec<String>,
}

impl std::fmt::Debug for RegionAssigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionAssigner")
            .field("regions", &self.names)
            .finish_non_exhaustive()
    }
}

impl RegionAssigner {
    /// Builds the index from regions in catalog declaration order.
    #[must_use]
    pub fn new(regions: &[Region]) -> Self {
        let entries = regions
            .iter()
            .enumerate()
            .map(|(catalog_index, region)| RegionEntry {
                catalog_index,
                envelope: AABB::from_corners(
                    [region.bounds.lon_min, region.bounds.lat_min],
                    [region.bounds.lon_max, region.bounds.lat_max],
                ),
            })
            .collect();

        log::debug!("Built region index over {} regions", regions.len());

        Self {
            tree: RTree::bulk_load(entries),
            names: regions.iter().map(|r| r.name.clone()).collect(),
        }
    }

    /// Builds the index for a validated catalog.
    #[must_use]
    pub fn from_catalog(catalog: &RegionCatalog) -> Self {
        Self::new(catalog.regions())
    }

    /// Looks up the region for a point.
    ///
    /// Among all boxes containing the point (edges inclusive), the one
    /// declared first in the catalog wins. Returns `None` when no box
    /// contains the point.
    #[must_use]
    pub fn lookup(&self, lat: f64, lon: f64) -> Option<&str> {
        let query_env = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.catalog_index)
            .min()
            .map(|idx| self.names[idx].as_str())
    }

    /// Region for a point, falling back to [`FALLBACK_REGION`].
    #[must_use]
    pub fn region_for(&self, lat: f64, lon: f64) -> &str {
        self.lookup(lat, lon).unwrap_or(FALLBACK_REGION)
    }

    /// Assigns every venue with valid coordinates to exactly one region.
    ///
    /// Venues are processed in parallel; the result does not depend on
    /// execution order. Venues with missing, non-finite or out-of-range
    /// coordinates are reported in [`Assignment::dropped`].
    #[must_use]
    pub fn assign(&self, venues: &[Venue]) -> Assignment {
        let outcomes: Vec<Result<AssignedVenue, DroppedVenue>> = venues
            .par_iter()
            .map(|venue| match validate_coordinates(venue) {
                Ok((lat, lon)) => Ok(AssignedVenue {
                    venue_id: venue.id.clone(),
                    region: self.region_for(lat, lon).to_string(),
                }),
                Err(reason) => Err(DroppedVenue {
                    venue_id: venue.id.clone(),
                    reason,
                }),
            })
            .collect();

        let mut assignment = Assignment::default();
        for outcome in outcomes {
            match outcome {
                Ok(assigned) => assignment.assigned.push(assigned),
                Err(dropped) => {
                    log::warn!(
                        "Dropping venue {} ({:?})",
                        dropped.venue_id,
                        dropped.reason
                    );
                    assignment.dropped.push(dropped);
                }
            }
        }

        log::info!(
            "Assigned {} venues ({} to {FALLBACK_REGION}), dropped {}",
            assignment.assigned.len(),
            assignment.fallback_count(),
            assignment.dropped.len()
        );

        assignment
    }
}

/// Assigns venues to regions given in catalog order.
///
/// Convenience wrapper around [`RegionAssigner`] for one-off batches.
#[must_use]
pub fn assign(venues: &[Venue], regions: &[Region]) -> Assignment {
    RegionAssigner::new(regions).assign(venues)
}

fn validate_coordinates(venue: &Venue) -> Result<(f64, f64), DropReason> {
    let Some((lat, lon)) = venue.coordinates() else {
        return Err(if venue.latitude.is_none() || venue.longitude.is_none() {
            DropReason::MissingCoordinate
        } else {
            DropReason::NonFiniteCoordinate
        });
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(DropReason::OutOfRange);
    }
    Ok((lat, lon))
}
