//! Top-level owner of one road network.
//!
//! A [`RoadNetwork`] validates its config, resolves a root on land, and
//! on [`RoadNetwork::create_network`] runs the [`Grower`] to completion.
//! The instance snapshot is read-only from then on.

use crate::{
    config::GrowthConfig,
    error::NetworkError,
    grower::{GrowthReport, Grower, Termination},
    instances::NetworkInstances,
    spatial_grid::SpatialIndex,
    terrain::TerrainField,
    types::Layer,
};
use glam::Vec2;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Columns sampled before root resolution gives up.
pub const MAX_ROOT_ATTEMPTS: u32 = 64;

/// Rows scanned per column, bottom to top across the domain.
pub const ROOT_SCAN_ROWS: u32 = 512;

/// Root columns are drawn from `[-ROOT_COLUMN_SPREAD, ROOT_COLUMN_SPREAD)`.
const ROOT_COLUMN_SPREAD: f32 = 0.5;

const ROOT_STREAM: u64 = 0;
const GROWTH_STREAM: u64 = 1;

/// Finds the lowest land point in a randomly chosen column.
///
/// Each attempt draws a column `x` and walks `y` up from `-1` in
/// [`ROOT_SCAN_ROWS`] steps, stopping at the first sample with
/// `height_field > 0`.
///
/// ### Returns
/// - `Ok(root)` on land.
/// - `Err(NetworkError::NoLand)` after [`MAX_ROOT_ATTEMPTS`] dry columns.
pub fn resolve_root<T, R>(terrain: &T, rng: &mut R) -> Result<Vec2, NetworkError>
where
    T: TerrainField + ?Sized,
    R: Rng,
{
    let step = 2.0 / ROOT_SCAN_ROWS as f32;
    for _ in 0..MAX_ROOT_ATTEMPTS {
        let x = rng.random_range(-ROOT_COLUMN_SPREAD..ROOT_COLUMN_SPREAD);
        for row in 0..=ROOT_SCAN_ROWS {
            let pos = Vec2::new(x, -1.0 + row as f32 * step);
            if terrain.height_field(pos) > 0.0 {
                return Ok(pos);
            }
        }
    }

    Err(NetworkError::NoLand {
        attempts: MAX_ROOT_ATTEMPTS,
    })
}

/// A terrain, its growth parameters, and the network grown over it.
pub struct RoadNetwork<T: TerrainField> {
    terrain: T,
    config: GrowthConfig,
    root: Vec2,
    index: Option<SpatialIndex>,
    instances: NetworkInstances,
    report: Option<GrowthReport>,
}

impl<T: TerrainField> RoadNetwork<T> {
    /// Validates `config` and resolves the root with a generator seeded
    /// from `config.seed`.
    pub fn new(terrain: T, config: GrowthConfig) -> Result<Self, NetworkError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(ROOT_STREAM);
        let root = resolve_root(&terrain, &mut rng)?;
        info!("road network root resolved at ({:.4}, {:.4})", root.x, root.y);

        Ok(Self {
            terrain,
            config,
            root,
            index: None,
            instances: NetworkInstances::default(),
            report: None,
        })
    }

    /// Grows the network using a generator seeded from `config.seed`.
    ///
    /// Calling this again regrows from scratch and yields the same result.
    pub fn create_network(&mut self) -> &NetworkInstances {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(GROWTH_STREAM);
        self.create_network_with_rng(&mut rng)
    }

    /// Grows the network drawing street jitter from `rng`.
    pub fn create_network_with_rng<R: Rng>(&mut self, rng: &mut R) -> &NetworkInstances {
        let mut grower = Grower::new(&self.terrain, &self.config, rng);
        debug!(
            "growing from ({:.4}, {:.4}) on a {k}x{k} grid, minor edge {:.4}",
            self.root.x,
            self.root.y,
            self.config.highway_length(),
            k = grower.index().grid(Layer::Highway).cells_per_axis(),
        );

        let report = grower.run(self.root);
        let (index, instances) = grower.finish();

        match report.termination {
            Termination::CapReached => {
                debug!("growth stopped at a cap after {} iterations", report.iterations)
            }
            Termination::Exhausted => {
                debug!("growth ran out of branches after {} iterations", report.iterations)
            }
        }
        info!(
            "road network grown: {} highway / {} street segments, {} / {} junctions, {} coastline crossings",
            instances.highway_count(),
            instances.street_count(),
            index.junction_count(Layer::Highway),
            index.junction_count(Layer::Street),
            report.coastline_segments,
        );

        self.index = Some(index);
        self.instances = instances;
        self.report = Some(report);
        &self.instances
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn root(&self) -> Vec2 {
        self.root
    }

    /// Records from the last growth, empty before the first.
    pub fn instances(&self) -> &NetworkInstances {
        &self.instances
    }

    /// Grids from the last growth.
    pub fn index(&self) -> Option<&SpatialIndex> {
        self.index.as_ref()
    }

    pub fn report(&self) -> Option<GrowthReport> {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ConfigError, terrain::UniformTerrain};

    /// Water below `shore`, land with population `population` above it.
    struct Coast {
        shore: f32,
        population: f32,
    }

    impl TerrainField for Coast {
        fn height_field(&self, pos: Vec2) -> f32 {
            if pos.y > self.shore { 0.4 } else { 0.0 }
        }

        fn population_density(&self, pos: Vec2) -> f32 {
            if self.height_field(pos) > 0.0 {
                self.population
            } else {
                0.0
            }
        }
    }

    fn small_config() -> GrowthConfig {
        GrowthConfig {
            street_cap: 300,
            highway_cap: 300,
            seed: 11,
            ..GrowthConfig::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GrowthConfig {
            street_cap: 0,
            ..GrowthConfig::default()
        };
        let terrain = UniformTerrain {
            height: 0.5,
            population: 1.0,
        };
        assert!(matches!(
            RoadNetwork::new(terrain, config),
            Err(NetworkError::Config(ConfigError::ZeroCap { .. }))
        ));
    }

    #[test]
    fn all_water_has_no_root() {
        let terrain = UniformTerrain {
            height: 0.0,
            population: 0.0,
        };
        assert!(matches!(
            RoadNetwork::new(terrain, small_config()),
            Err(NetworkError::NoLand {
                attempts: MAX_ROOT_ATTEMPTS
            })
        ));
    }

    #[test]
    fn root_is_the_lowest_land_in_its_column() {
        let terrain = Coast {
            shore: 0.25,
            population: 0.0,
        };
        let network = RoadNetwork::new(terrain, small_config()).unwrap();
        let root = network.root();

        assert!(network.terrain().height_field(root) > 0.0);
        assert!(root.y <= 0.25 + 2.0 / ROOT_SCAN_ROWS as f32 + 1e-5);
        assert!((-0.5..0.5).contains(&root.x));
    }

    #[test]
    fn network_is_empty_until_grown() {
        let terrain = UniformTerrain {
            height: 0.5,
            population: 2.0,
        };
        let mut network = RoadNetwork::new(terrain, small_config()).unwrap();
        assert_eq!(network.instances().highway_count(), 0);
        assert!(network.index().is_none());
        assert!(network.report().is_none());

        let highways = network.create_network().highway_count();
        assert!(highways > 0);
        assert!(network.index().is_some());
        assert_eq!(
            network.index().unwrap().edge_count(Layer::Highway),
            highways
        );
    }

    #[test]
    fn regrowing_reproduces_the_same_network() {
        let terrain = UniformTerrain {
            height: 0.5,
            population: 2.0,
        };
        let mut network = RoadNetwork::new(terrain, small_config()).unwrap();
        let first = network.create_network().clone();
        let second = network.create_network().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn caller_supplied_rng_drives_jitter() {
        let terrain = UniformTerrain {
            height: 0.5,
            population: 0.0,
        };
        let mut network = RoadNetwork::new(terrain, small_config()).unwrap();

        let mut a = ChaCha8Rng::seed_from_u64(1);
        let first = network.create_network_with_rng(&mut a).clone();
        let mut b = ChaCha8Rng::seed_from_u64(2);
        let second = network.create_network_with_rng(&mut b).clone();

        assert_eq!(first.street_count(), 2);
        assert_eq!(second.street_count(), 2);
        assert_ne!(first.street.rotate, second.street.rotate);
    }
}
