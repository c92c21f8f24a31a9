//! Procedural road network growth over a terrain field.
//!
//! Main components:
//! - [`turtle`] — oriented, scaled walkers that lay down segments.
//! - [`edge`] — committed segments and the intersection predicate.
//! - [`spatial_grid`] — per-layer bucket grids for edges and junctions.
//! - [`terrain`] — the terrain trait and its fBm / texture implementations.
//! - [`grower`] — the branching growth state machine.
//! - [`instances`] — per-layer drawable records of committed segments.
//! - [`network`] — top-level owner: root resolution and growth.
//! - [`config`] — growth parameters.
//! - [`error`] — error types.
//! - [`types`] — shared enums and IDs.

pub mod config;
pub mod edge;
pub mod error;
pub mod grower;
pub mod instances;
pub mod network;
pub mod spatial_grid;
pub mod terrain;
pub mod turtle;
pub mod types;

pub use config::GrowthConfig;
pub use network::RoadNetwork;
pub use terrain::TerrainField;
pub use types::Layer;
