//! Uniform bucket grids over the normalized growth domain `[-1, 1]²`.
//!
//! Each road layer owns one [`SpatialGrid`]. A grid cell holds the edges
//! whose midpoint falls inside it and the junction points inside it. The
//! [`SpatialIndex`] pairs a highway grid with a street grid and keeps the
//! street grid a superset of the highway grid by inserting every highway
//! commit into both (as a copy, not a shared reference).

use crate::{
    edge::Edge,
    types::{CellId, Layer},
};
use glam::Vec2;

/// Domain extent used to size the grid relative to the minor edge length.
pub const GRID_SPAN: f32 = 0.4;

/// Hits and endpoints closer than this to a candidate's start are
/// degenerate self-touches.
pub const OVERLAP_EPS: f32 = 1e-4;

/// Factor applied to a candidate's length when looking for T-junctions
/// just past its natural endpoint.
pub const EXTENSION_FACTOR: f32 = 1.5;

/// Initial nearest-hit distance, in minor edge lengths.
const MAX_REACH_FACTOR: f32 = 8.0;

/// Upper bound on cells per axis, whatever the minor edge.
pub const MAX_CELLS_PER_AXIS: usize = 256;

/// Cells scanned on each side of the candidate's own cell.
const NEIGHBORHOOD_RADIUS: usize = 2;

/// How a candidate edge fits against what is already committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// Nothing in the way; the candidate can be committed as is.
    Clear,
    /// The candidate ends at a new crossing point, which becomes a junction.
    Truncated(Vec2),
    /// The candidate ends on an existing junction, which is reused.
    Snapped(Vec2),
    /// The resolved endpoint collapses onto the start; reject the candidate.
    Overlapping,
}

impl Resolution {
    /// Endpoint to commit for `candidate`, or `None` when rejected.
    pub fn endpoint(&self, candidate: &Edge) -> Option<Vec2> {
        match *self {
            Resolution::Clear => Some(candidate.target),
            Resolution::Truncated(p) | Resolution::Snapped(p) => Some(p),
            Resolution::Overlapping => None,
        }
    }
}

/// One layer's bucket grid.
///
/// Cells are addressed as `i * (k + 1) + j`, where `k` is
/// [`SpatialGrid::cells_per_axis`]. Cell coordinates are clamped to
/// `[0, k]`, so the grid stores `(k + 1)²` cells and points outside the
/// domain pile up in the border cells.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    k: usize,
    max_reach: f32,
    edges: Vec<Vec<Edge>>,
    junctions: Vec<Vec<Vec2>>,
}

impl SpatialGrid {
    /// Creates an empty grid sized for edges of length `minor_edge`.
    pub fn new(minor_edge: f32) -> Self {
        let k = cells_per_axis_for(minor_edge);
        let cells = (k + 1) * (k + 1);
        Self {
            k,
            max_reach: minor_edge * MAX_REACH_FACTOR,
            edges: vec![Vec::new(); cells],
            junctions: vec![Vec::new(); cells],
        }
    }

    #[inline]
    pub fn cells_per_axis(&self) -> usize {
        self.k
    }

    /// Cell containing `p`, clamped to the grid.
    pub fn cell_of(&self, p: Vec2) -> CellId {
        let (i, j) = self.cell_coords(p);
        self.cell_id(i, j)
    }

    pub fn insert_edge(&mut self, edge: Edge) {
        let cell = self.cell_of(edge.midpoint);
        self.edges[cell].push(edge);
    }

    pub fn insert_junction(&mut self, point: Vec2) {
        let cell = self.cell_of(point);
        self.junctions[cell].push(point);
    }

    pub fn edges_in_cell(&self, cell: CellId) -> &[Edge] {
        &self.edges[cell]
    }

    pub fn junctions_in_cell(&self, cell: CellId) -> &[Vec2] {
        &self.junctions[cell]
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().flatten()
    }

    pub fn junctions(&self) -> impl Iterator<Item = &Vec2> + '_ {
        self.junctions.iter().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.iter().map(Vec::len).sum()
    }

    /// Returns `true` if `edge` was committed to the cell of its midpoint.
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges[self.cell_of(edge.midpoint)].contains(edge)
    }

    /// Cells of the 5×5 block centered on the cell of `center`.
    pub fn neighborhood(&self, center: Vec2) -> impl Iterator<Item = CellId> + '_ {
        let (ci, cj) = self.cell_coords(center);
        let rows = ci.saturating_sub(NEIGHBORHOOD_RADIUS)..=(ci + NEIGHBORHOOD_RADIUS).min(self.k);
        rows.flat_map(move |i| {
            let cols =
                cj.saturating_sub(NEIGHBORHOOD_RADIUS)..=(cj + NEIGHBORHOOD_RADIUS).min(self.k);
            cols.map(move |j| self.cell_id(i, j))
        })
    }

    /// Resolves `candidate` against the edges and junctions around it.
    ///
    /// 1. The nearest crossing between `candidate` and a committed edge
    ///    wins. When the candidate misses an edge, its 1.5× extension is
    ///    tested against that edge instead, catching T-junctions just past
    ///    the natural endpoint. Hits closer than [`OVERLAP_EPS`] to the
    ///    start are ignored.
    /// 2. If a crossing was found, a committed junction within
    ///    `snap_radius` of it that is nearer than the best distance so far
    ///    replaces it.
    /// 3. An endpoint within [`OVERLAP_EPS`] of the start rejects the
    ///    candidate.
    ///
    /// ### Parameters
    /// - `candidate` - Proposed edge, starting where the turtle stands.
    /// - `snap_radius` - Junction capture radius for this turtle.
    ///
    /// ### Returns
    /// The [`Resolution`] describing where the edge should end.
    pub fn query(&self, candidate: &Edge, snap_radius: f32) -> Resolution {
        let start = candidate.start;
        let extended = candidate.extended(EXTENSION_FACTOR);

        let mut best = self.max_reach;
        let mut endpoint = None;

        for cell in self.neighborhood(candidate.midpoint) {
            for other in &self.edges[cell] {
                let hit = candidate
                    .intersects_with(other)
                    .or_else(|| extended.intersects_with(other));
                if let Some(p) = hit {
                    let dist = start.distance(p);
                    if dist >= OVERLAP_EPS && dist < best {
                        best = dist;
                        endpoint = Some(p);
                    }
                }
            }
        }

        let Some(mut proposed) = endpoint else {
            return if candidate.length() < OVERLAP_EPS {
                Resolution::Overlapping
            } else {
                Resolution::Clear
            };
        };

        let mut snapped = false;
        for cell in self.neighborhood(candidate.midpoint) {
            for &junction in &self.junctions[cell] {
                let dist = junction.distance(proposed);
                if dist < snap_radius && dist < best && start.distance(junction) >= OVERLAP_EPS {
                    best = dist;
                    proposed = junction;
                    snapped = true;
                }
            }
        }

        if start.distance(proposed) < OVERLAP_EPS {
            Resolution::Overlapping
        } else if snapped {
            Resolution::Snapped(proposed)
        } else {
            Resolution::Truncated(proposed)
        }
    }

    fn cell_coords(&self, p: Vec2) -> (usize, usize) {
        (self.axis_cell(p.x), self.axis_cell(p.y))
    }

    fn axis_cell(&self, v: f32) -> usize {
        let cell = ((v + 1.0) * self.k as f32 / 2.0).floor();
        if cell.is_nan() {
            0
        } else {
            cell.clamp(0.0, self.k as f32) as usize
        }
    }

    #[inline]
    fn cell_id(&self, i: usize, j: usize) -> CellId {
        i * (self.k + 1) + j
    }
}

fn cells_per_axis_for(minor_edge: f32) -> usize {
    let cells = (GRID_SPAN / minor_edge).ceil();
    if cells.is_finite() && cells >= 1.0 {
        (cells as usize).min(MAX_CELLS_PER_AXIS)
    } else if cells.is_infinite() && cells > 0.0 {
        MAX_CELLS_PER_AXIS
    } else {
        1
    }
}

/// The highway and street grids of one network.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    highway: SpatialGrid,
    street: SpatialGrid,
}

impl SpatialIndex {
    pub fn new(minor_edge: f32) -> Self {
        Self {
            highway: SpatialGrid::new(minor_edge),
            street: SpatialGrid::new(minor_edge),
        }
    }

    pub fn grid(&self, layer: Layer) -> &SpatialGrid {
        match layer {
            Layer::Highway => &self.highway,
            Layer::Street => &self.street,
        }
    }

    /// Commits `edge` to `layer`. Highway edges are mirrored into the
    /// street grid.
    pub fn commit(&mut self, edge: Edge, layer: Layer) {
        if layer == Layer::Highway {
            self.highway.insert_edge(edge);
        }
        self.street.insert_edge(edge);
    }

    /// Commits a junction point to `layer`, mirrored like [`Self::commit`].
    pub fn commit_junction(&mut self, point: Vec2, layer: Layer) {
        if layer == Layer::Highway {
            self.highway.insert_junction(point);
        }
        self.street.insert_junction(point);
    }

    /// Resolves `candidate` against the grid of `layer`.
    pub fn query(&self, candidate: &Edge, layer: Layer, snap_radius: f32) -> Resolution {
        self.grid(layer).query(candidate, snap_radius)
    }

    pub fn edge_count(&self, layer: Layer) -> usize {
        self.grid(layer).edge_count()
    }

    pub fn junction_count(&self, layer: Layer) -> usize {
        self.grid(layer).junction_count()
    }
}
