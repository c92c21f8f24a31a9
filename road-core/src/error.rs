//! Error types for road network construction.
//!
//! Geometry and growth never fail: a segment that cannot be placed simply
//! dies. Errors are reserved for inputs that would make growth meaningless.

use thiserror::Error;

/// A [`crate::config::GrowthConfig`] value outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A density that is zero, negative or not finite.
    #[error("{name} must be a positive finite number, got {value}")]
    NonPositiveDensity {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// Highway density above the largest the grid can be sized for.
    #[error("highway_density must be at most {max}, got {value}")]
    HighwayDensityTooHigh {
        /// Rejected value.
        value: f32,
        /// Largest accepted density.
        max: f32,
    },

    /// Street density low enough to make street turtles read as highways.
    #[error("street_density must be above {min}, got {value}")]
    StreetDensityTooLow {
        /// Rejected value.
        value: f32,
        /// Densities at or below this are rejected.
        min: f32,
    },

    /// Highway threshold outside `[0, max]`.
    #[error("highway threshold must lie in [0, {max}], got {value}")]
    ThresholdOutOfRange {
        /// Rejected value.
        value: f32,
        /// Largest accepted threshold.
        max: f32,
    },

    /// A growth cap of zero would never produce a segment.
    #[error("{name} must be at least 1")]
    ZeroCap {
        /// Field name.
        name: &'static str,
    },

    /// Street jitter outside `[0, 90)` degrees.
    #[error("street jitter must lie in [0, 90) degrees, got {0}")]
    JitterOutOfRange(f32),
}

/// Failure to set up a [`crate::network::RoadNetwork`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("invalid growth config: {0}")]
    Config(#[from] ConfigError),

    /// No sampled column of the domain contained land.
    #[error("no land found for the root after {attempts} column scans")]
    NoLand {
        /// Number of columns scanned.
        attempts: u32,
    },
}

/// Invalid input for a [`crate::terrain::SampledTerrain`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerrainError {
    #[error("terrain texture must have non-zero dimensions, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },

    #[error("terrain texture of {width}x{height} needs {expected} bytes, got {got}")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
}
