use crate::{error::ConfigError, turtle::HIGHWAY_SCALE_CUTOFF};
use glam::Vec3;

/// Width of a highway segment in normalized domain units.
pub const HIGHWAY_WIDTH: f32 = 0.008;

/// Highway segment length at `highway_density == 1.0`.
pub const BASE_HIGHWAY_LENGTH: f32 = 0.2;

/// Street scale at `street_density == 1.0`.
pub const BASE_STREET_SCALE: f32 = 0.5;

/// Largest `highway_density` accepted by [`GrowthConfig::validate`].
pub const MAX_HIGHWAY_DENSITY: f32 = 8.0;

/// Largest population cutoff accepted by [`GrowthConfig::validate`].
pub const MAX_HIGHWAY_THRESHOLD: f32 = 4.0;

/// Parameters for growing a road network.
///
/// Densities are inversely related to segment length: doubling
/// `highway_density` halves the highway step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthConfig {
    pub highway_density: f32,
    pub street_density: f32,
    /// Population density a highway step must exceed to be accepted.
    pub highway_threshold: f32,
    /// Growth stops once this many street records exist.
    pub street_cap: usize,
    /// Upper bound on highway records.
    pub highway_cap: usize,
    /// Seeds every random draw made during root resolution and growth.
    pub seed: u64,
    /// Maximum random offset, in degrees, applied to street spur headings.
    pub street_jitter_degrees: f32,
    /// Align streets to the world axes and disable jitter.
    pub checkered: bool,
    /// Let accepted, unsnapped street spurs keep growing as branches.
    pub continue_streets: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            highway_density: 1.0,
            street_density: 3.0,
            highway_threshold: 0.9,
            street_cap: 5000,
            highway_cap: 5000,
            seed: 0,
            street_jitter_degrees: 10.0,
            checkered: false,
            continue_streets: false,
        }
    }
}

impl GrowthConfig {
    /// Checks every field against its valid range.
    ///
    /// ### Returns
    /// - `Ok(())` if growth can run with this config.
    /// - `Err(ConfigError)` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("highway_density", self.highway_density),
            ("street_density", self.street_density),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveDensity { name, value });
            }
        }

        if self.highway_density > MAX_HIGHWAY_DENSITY {
            return Err(ConfigError::HighwayDensityTooHigh {
                value: self.highway_density,
                max: MAX_HIGHWAY_DENSITY,
            });
        }

        // Street turtles must stay below the highway cutoff.
        if self.street_scale() >= HIGHWAY_SCALE_CUTOFF {
            return Err(ConfigError::StreetDensityTooLow {
                value: self.street_density,
                min: min_street_density(),
            });
        }

        if !(0.0..=MAX_HIGHWAY_THRESHOLD).contains(&self.highway_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.highway_threshold,
                max: MAX_HIGHWAY_THRESHOLD,
            });
        }

        if self.street_cap == 0 {
            return Err(ConfigError::ZeroCap { name: "street_cap" });
        }
        if self.highway_cap == 0 {
            return Err(ConfigError::ZeroCap {
                name: "highway_cap",
            });
        }

        if !(0.0..90.0).contains(&self.street_jitter_degrees) {
            return Err(ConfigError::JitterOutOfRange(self.street_jitter_degrees));
        }

        Ok(())
    }

    /// Turtle scale for highway segments: `(width, length, depth)`.
    pub fn highway_dimensions(&self) -> Vec3 {
        Vec3::new(HIGHWAY_WIDTH, self.highway_length(), 0.0)
    }

    /// Length of one highway step. Also the grid's minor edge dimension.
    pub fn highway_length(&self) -> f32 {
        BASE_HIGHWAY_LENGTH / self.highway_density
    }

    /// Scale factor applied to street turtles relative to highways.
    pub fn street_scale(&self) -> f32 {
        BASE_STREET_SCALE / self.street_density
    }

    /// Radius within which a proposed endpoint snaps onto a junction.
    pub fn snap_radius(&self, street_scale: f32) -> f32 {
        0.5 * self.highway_length() * street_scale
    }
}

/// Street densities at or below this give street turtles highway scale.
pub fn min_street_density() -> f32 {
    BASE_STREET_SCALE / HIGHWAY_SCALE_CUTOFF
}
