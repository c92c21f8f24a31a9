/// Road layer an edge, junction or instance record belongs to.
///
/// The street layer is a superset of the highway layer: everything
/// committed as a highway is also visible to street queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Highway,
    Street,
}

/// Flat index of a cell inside a [`crate::spatial_grid::SpatialGrid`].
///
/// Only meaningful for the grid that produced it.
pub type CellId = usize;
