//! Terrain signals consumed by road growth.
//!
//! Growth only sees the [`TerrainField`] trait: an elevation-derived land
//! height, a population density, and two position-hashed noises. Two
//! implementations are provided:
//! - [`FbmTerrain`] — seeded fBm fields evaluated on demand.
//! - [`SampledTerrain`] — an RGBA8 texture covering `[-1, 1]²`, as read
//!   back from a GPU pass. [`FbmTerrain::bake`] produces one.
//!
//! All lookups clamp positions into the domain.

use crate::error::TerrainError;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use glam::{Vec2, Vec3};

/// Elevation samples above this are water. Land height is measured down
/// from it, so the highest land value is `SEA_CEILING`.
pub const SEA_CEILING: f32 = 0.75;

/// Multiplier turning biased population samples into density weights.
pub const DENSITY_GAIN: f32 = 3.0;

/// Multiplier turning unit elevation samples into raw elevation.
pub const ELEVATION_GAIN: f32 = 1.25;

const DENSITY_BIAS: f32 = 0.775;

/// Largest `f32` strictly below one.
const BELOW_ONE: f32 = 1.0 - f32::EPSILON;

/// Signals the road grower reads from the world.
pub trait TerrainField {
    /// `0` over water or invalid ground, otherwise land height in
    /// `(0, SEA_CEILING]`.
    fn height_field(&self, pos: Vec2) -> f32;

    /// Population weight, `>= 0` and `0` over water.
    fn population_density(&self, pos: Vec2) -> f32;

    /// Deterministic hash of `p` in `[0, 1)`.
    fn noise(&self, p: Vec3) -> f32 {
        hash_noise(p)
    }

    /// Second hash of `p` in `[0, 1)`, independent of [`TerrainField::noise`].
    fn noise2(&self, p: Vec3) -> f32 {
        hash_noise2(p)
    }
}

impl<T: TerrainField + ?Sized> TerrainField for &T {
    fn height_field(&self, pos: Vec2) -> f32 {
        (**self).height_field(pos)
    }

    fn population_density(&self, pos: Vec2) -> f32 {
        (**self).population_density(pos)
    }

    fn noise(&self, p: Vec3) -> f32 {
        (**self).noise(p)
    }

    fn noise2(&self, p: Vec3) -> f32 {
        (**self).noise2(p)
    }
}

/// Sine-hash of a position in `[0, 1)`.
pub fn hash_noise(p: Vec3) -> f32 {
    let p = p.as_dvec3();
    let v = ((p.x * 10.0 + 100.0) * 987.654
        + (p.y * 10.0 + 100.0) * 123.456
        + (p.z * 10.0 + 100.0) * 531.975)
        .sin()
        * 85734.3545;
    unit_fract(v)
}

/// Sine-hash of a position in `[0, 1)` with constants unrelated to
/// [`hash_noise`].
pub fn hash_noise2(p: Vec3) -> f32 {
    let p = p.as_dvec3();
    let v = ((p.x * 10.0 - 100.0) * 456.789
        + (p.y * 10.0 - 100.0) * 654.321
        + (p.z * 10.0 - 100.0) * 579.135)
        .sin()
        * 54534.3758;
    unit_fract(v)
}

fn unit_fract(v: f64) -> f32 {
    let v = v.abs();
    let fract = (v - v.floor()) as f32;
    if fract.is_finite() {
        fract.min(BELOW_ONE)
    } else {
        0.0
    }
}

/// Land height for a raw elevation sample.
pub fn land_height(elevation: f32) -> f32 {
    if elevation <= SEA_CEILING {
        SEA_CEILING - elevation.max(0.0)
    } else {
        // Also catches NaN.
        0.0
    }
}

/// Population density for a unit population sample at a given land height.
pub fn density_weight(population: f32, height: f32) -> f32 {
    if !(height > 0.0) || !population.is_finite() {
        return 0.0;
    }
    population.max(0.0) * bias(DENSITY_BIAS, height) * DENSITY_GAIN
}

fn bias(b: f32, t: f32) -> f32 {
    t.powf(b.ln() / 0.5_f32.ln())
}

#[inline]
fn clamp_to_domain(pos: Vec2) -> Vec2 {
    pos.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Seeded fBm terrain evaluated directly from noise.
pub struct FbmTerrain {
    seed: i32,
    elevation: FastNoiseLite,
    population: FastNoiseLite,
}

impl FbmTerrain {
    pub fn new(seed: i32) -> Self {
        let mut elevation = FastNoiseLite::with_seed(seed);
        elevation.set_noise_type(Some(NoiseType::OpenSimplex2));
        elevation.set_frequency(Some(1.75));
        elevation.set_fractal_type(Some(FractalType::FBm));
        elevation.set_fractal_octaves(Some(8));
        elevation.set_fractal_gain(Some(0.5));
        elevation.set_fractal_lacunarity(Some(1.5));

        let mut population = FastNoiseLite::with_seed(seed.wrapping_add(1));
        population.set_noise_type(Some(NoiseType::OpenSimplex2));
        population.set_frequency(Some(5.0));
        population.set_fractal_type(Some(FractalType::FBm));
        population.set_fractal_octaves(Some(8));
        population.set_fractal_gain(Some(0.75));
        population.set_fractal_lacunarity(Some(1.5));

        Self {
            seed,
            elevation,
            population,
        }
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Renders both fields into an RGBA8 texture of `width × height`.
    ///
    /// Texel `(x, y)` samples the domain point that
    /// [`SampledTerrain`] maps back onto it, so sampling the result at a
    /// texel center reproduces this terrain up to 8-bit quantization.
    pub fn bake(&self, width: usize, height: usize) -> Result<SampledTerrain, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptyDimensions { width, height });
        }

        let mut pixels = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let pos = Vec2::new(texel_to_domain(x, width), texel_to_domain(y, height));
                pixels.push(to_byte(self.elevation_unit(pos)));
                pixels.push(to_byte(self.population_unit(pos)));
                pixels.push(0);
                pixels.push(255);
            }
        }

        SampledTerrain::from_rgba(pixels, width, height)
    }

    fn elevation_unit(&self, pos: Vec2) -> f32 {
        let pos = clamp_to_domain(pos);
        let raw = self.elevation.get_noise_2d(pos.x, pos.y);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    fn population_unit(&self, pos: Vec2) -> f32 {
        let pos = clamp_to_domain(pos);
        let raw = self.population.get_noise_2d(pos.x, pos.y);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

impl TerrainField for FbmTerrain {
    fn height_field(&self, pos: Vec2) -> f32 {
        land_height(self.elevation_unit(pos) * ELEVATION_GAIN)
    }

    fn population_density(&self, pos: Vec2) -> f32 {
        let height = self.height_field(pos);
        density_weight(self.population_unit(pos), height)
    }
}

/// Terrain read back from an RGBA8 texture.
///
/// The red channel holds the unit elevation sample and the green channel
/// the unit population sample. The texture spans `[-1, 1]²`, row-major
/// from `y = -1`; lookups use the nearest texel.
#[derive(Debug, Clone)]
pub struct SampledTerrain {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl SampledTerrain {
    /// Wraps a pixel buffer of `width * height` RGBA8 texels.
    pub fn from_rgba(pixels: Vec<u8>, width: usize, height: usize) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptyDimensions { width, height });
        }
        let expected = width * height * 4;
        if pixels.len() != expected {
            return Err(TerrainError::BufferSize {
                width,
                height,
                expected,
                got: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn texel(&self, pos: Vec2) -> &[u8] {
        let pos = clamp_to_domain(pos);
        let x = domain_to_texel(pos.x, self.width);
        let y = domain_to_texel(pos.y, self.height);
        let offset = (y * self.width + x) * 4;
        &self.pixels[offset..offset + 4]
    }
}

impl TerrainField for SampledTerrain {
    fn height_field(&self, pos: Vec2) -> f32 {
        let elevation = from_byte(self.texel(pos)[0]);
        land_height(elevation * ELEVATION_GAIN)
    }

    fn population_density(&self, pos: Vec2) -> f32 {
        let texel = self.texel(pos);
        let height = land_height(from_byte(texel[0]) * ELEVATION_GAIN);
        density_weight(from_byte(texel[1]), height)
    }
}

/// Terrain with the same height and population everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformTerrain {
    pub height: f32,
    pub population: f32,
}

impl TerrainField for UniformTerrain {
    fn height_field(&self, _pos: Vec2) -> f32 {
        self.height
    }

    fn population_density(&self, _pos: Vec2) -> f32 {
        if self.height > 0.0 {
            self.population
        } else {
            0.0
        }
    }
}

fn texel_to_domain(index: usize, extent: usize) -> f32 {
    if extent <= 1 {
        0.0
    } else {
        index as f32 / (extent - 1) as f32 * 2.0 - 1.0
    }
}

fn domain_to_texel(coord: f32, extent: usize) -> usize {
    if extent <= 1 {
        return 0;
    }
    let last = (extent - 1) as f32;
    // NaN saturates to 0 in the cast.
    (((coord + 1.0) * 0.5 * last).round().clamp(0.0, last)) as usize
}

#[inline]
fn to_byte(unit: f32) -> u8 {
    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn from_byte(byte: u8) -> f32 {
    byte as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_noises_are_deterministic_and_in_unit_range() {
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.013 - 1.0, (i as f32 * 0.37).sin(), 0.0);
            let a = hash_noise(p);
            let b = hash_noise2(p);
            assert!((0.0..1.0).contains(&a), "noise out of range: {a}");
            assert!((0.0..1.0).contains(&b), "noise2 out of range: {b}");
            assert_eq!(a, hash_noise(p));
            assert_eq!(b, hash_noise2(p));
        }
    }

    #[test]
    fn hash_noises_disagree_somewhere() {
        let differ = (0..50)
            .map(|i| Vec3::new(i as f32 * 0.05, 0.1, 0.0))
            .any(|p| (hash_noise(p) - hash_noise2(p)).abs() > 1e-3);
        assert!(differ);
    }

    #[test]
    fn land_height_is_zero_above_ceiling() {
        assert_eq!(land_height(0.9), 0.0);
        assert_eq!(land_height(SEA_CEILING), 0.0);
        assert_eq!(land_height(f32::NAN), 0.0);
        assert!((land_height(0.25) - 0.5).abs() < 1e-6);
        assert!((land_height(0.0) - SEA_CEILING).abs() < 1e-6);
    }

    #[test]
    fn density_is_zero_over_water() {
        assert_eq!(density_weight(1.0, 0.0), 0.0);
        assert!(density_weight(0.5, 0.5) > 0.0);
        assert_eq!(density_weight(f32::NAN, 0.5), 0.0);
        assert_eq!(density_weight(1.0, f32::NAN), 0.0);
    }

    #[test]
    fn fbm_terrain_respects_field_contract() {
        let terrain = FbmTerrain::new(7);
        for i in 0..40 {
            for j in 0..40 {
                let pos = Vec2::new(i as f32 / 20.0 - 1.0, j as f32 / 20.0 - 1.0);
                let h = terrain.height_field(pos);
                let d = terrain.population_density(pos);
                assert!((0.0..=SEA_CEILING).contains(&h));
                assert!(d >= 0.0);
                if h == 0.0 {
                    assert_eq!(d, 0.0);
                }
            }
        }
    }

    #[test]
    fn fbm_terrain_is_reproducible_from_its_seed() {
        let terrain = FbmTerrain::new(21);
        let again = FbmTerrain::new(terrain.seed());
        assert_eq!(terrain.seed(), 21);
        for i in 0..20 {
            let pos = Vec2::new(i as f32 * 0.1 - 1.0, 0.3);
            assert_eq!(terrain.height_field(pos), again.height_field(pos));
            assert_eq!(terrain.population_density(pos), again.population_density(pos));
        }
    }

    #[test]
    fn fbm_terrain_clamps_out_of_range_queries() {
        let terrain = FbmTerrain::new(3);
        let edge = Vec2::new(1.0, -1.0);
        assert_eq!(
            terrain.height_field(Vec2::new(40.0, -12.0)),
            terrain.height_field(edge)
        );
        assert!(terrain.height_field(Vec2::new(f32::NAN, 0.0)).is_finite());
    }

    #[test]
    fn sampled_terrain_rejects_bad_buffers() {
        assert_eq!(
            SampledTerrain::from_rgba(vec![0; 12], 2, 2).err(),
            Some(TerrainError::BufferSize {
                width: 2,
                height: 2,
                expected: 16,
                got: 12,
            })
        );
        assert_eq!(
            SampledTerrain::from_rgba(Vec::new(), 0, 4).err(),
            Some(TerrainError::EmptyDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn sampled_terrain_uses_nearest_texel_and_clamps() {
        // 2×1 texture: left texel is water, right texel is populated land.
        let pixels = vec![255, 0, 0, 255, 0, 200, 0, 255];
        let terrain = SampledTerrain::from_rgba(pixels, 2, 1).expect("valid buffer");

        assert_eq!(terrain.height_field(Vec2::new(-0.9, 0.0)), 0.0);
        assert_eq!(terrain.population_density(Vec2::new(-0.9, 0.0)), 0.0);

        let h = terrain.height_field(Vec2::new(0.9, 0.3));
        assert!((h - SEA_CEILING).abs() < 1e-6);
        assert!(terrain.population_density(Vec2::new(0.9, 0.3)) > 0.0);

        assert_eq!(terrain.height_field(Vec2::new(25.0, -25.0)), h);
        assert_eq!(terrain.height_field(Vec2::new(-25.0, 25.0)), 0.0);
    }

    #[test]
    fn baked_terrain_matches_direct_evaluation() {
        let terrain = FbmTerrain::new(11);
        let baked = terrain.bake(33, 17).expect("non-empty dimensions");
        assert_eq!((baked.width(), baked.height()), (33, 17));

        // Half a quantization step of the red channel, in height units.
        let tolerance = ELEVATION_GAIN / 255.0 * 0.5 + 1e-5;
        for y in 0..17 {
            for x in 0..33 {
                let pos = Vec2::new(texel_to_domain(x, 33), texel_to_domain(y, 17));
                let direct = terrain.height_field(pos);
                let sampled = baked.height_field(pos);
                assert!(
                    (direct - sampled).abs() <= tolerance,
                    "mismatch at {pos:?}: {direct} vs {sampled}"
                );
            }
        }
    }

    #[test]
    fn uniform_terrain_has_no_population_over_water() {
        let land = UniformTerrain {
            height: 0.5,
            population: 2.0,
        };
        let water = UniformTerrain {
            height: 0.0,
            population: 2.0,
        };
        assert_eq!(land.population_density(Vec2::ZERO), 2.0);
        assert_eq!(water.population_density(Vec2::ZERO), 0.0);
    }
}
