#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial-temporal analytics engine.
//!
//! Turns per-region venue counts into density metrics, projects a
//! present-day density snapshot back in time, summarizes growth, and
//! cross-correlates two yearly series at varying lags to find which one
//! leads. Every function here is pure: output depends only on the inputs
//! and the declared seed.

pub mod correlation;
pub mod density;
pub mod growth;
pub mod noise;
pub mod peaks;
pub mod projection;
pub mod synthesis;

use thiserror::Error;
use venue_density_analytics_models::SeriesError;

/// Errors that can occur during analytics operations.
///
/// All of these are local to one region; callers running many regions
/// record them and carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// A growth summary needs at least two points.
    #[error("Insufficient data for '{region}': {points} point(s), need at least 2")]
    InsufficientData {
        /// Region name.
        region: String,
        /// Number of points available.
        points: usize,
    },

    /// An input value is outside its domain.
    #[error("Invalid input for '{region}': {message}")]
    InvalidInput {
        /// Region name.
        region: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A constructed series violated the series invariants.
    #[error("Series error: {0}")]
    Series(#[from] SeriesError),
}
