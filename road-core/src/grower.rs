//! Turtle-driven road growth.
//!
//! The [`Grower`] keeps one current branch and a LIFO stack of pending
//! branches. Each iteration:
//! 1. a highway-mode current spawns two diagonal highway branches whose
//!    angles come from the terrain's two position-hashed noises;
//! 2. every current spawns two perpendicular street spurs, jittered by the
//!    injected random generator;
//! 3. the current takes its own step, continuing on success and otherwise
//!    yielding to the most recently pushed branch.
//!
//! A step proposes one edge, asks the [`SpatialIndex`] how it fits against
//! committed edges and junctions, and commits the result. Branches die
//! silently when the terrain rejects them, when the candidate collapses,
//! or when their layer is at its cap.

use crate::{
    config::GrowthConfig,
    edge::Edge,
    instances::{InstanceRecord, NetworkInstances},
    spatial_grid::{Resolution, SpatialIndex},
    terrain::TerrainField,
    turtle::Turtle,
    types::Layer,
};
use glam::{Vec2, Vec3};
use rand::Rng;

/// Half-width of the noise-driven diagonal branch angle, in degrees.
pub const BRANCH_SPREAD: f32 = 75.0;

/// Extra turn pushing diagonal branches away from the parent heading.
pub const BRANCH_BIAS: f32 = 15.0;

/// Turn applied to street spurs relative to their parent, in degrees.
pub const SPUR_ANGLE: f32 = 90.0;

/// What a single step did to its branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Committed a new edge; the turtle stands on its endpoint.
    Extended,
    /// Committed an edge ending on an existing junction.
    Joined,
    /// Committed a double-length edge from water onto land.
    Coastline,
    /// Nothing committed.
    Dead,
}

impl StepOutcome {
    /// Whether the branch keeps growing after this step.
    #[inline]
    pub fn continues(self) -> bool {
        matches!(self, StepOutcome::Extended | StepOutcome::Coastline)
    }
}

/// Why growth stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// A layer reached its record cap.
    CapReached,
    /// Every branch died.
    Exhausted,
}

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthReport {
    pub termination: Termination,
    /// Loop iterations, one per current-branch visit.
    pub iterations: usize,
    pub coastline_segments: usize,
    /// Deepest branch that committed an edge.
    pub max_depth: u32,
}

/// Diagonal branch angles, in degrees, for two noise samples in `[0, 1)`.
///
/// Each angle is spread over `±BRANCH_SPREAD` and pushed a further
/// `BRANCH_BIAS` away from zero. The second angle always turns the other
/// way from the first so the pair fans out.
pub fn branch_angles(n1: f32, n2: f32) -> (f32, f32) {
    let first = push_outward(2.0 * BRANCH_SPREAD * n1 - BRANCH_SPREAD);
    let second = push_outward(2.0 * BRANCH_SPREAD * n2 - BRANCH_SPREAD).abs();
    let second = if first > 0.0 { -second } else { second };
    (first, second)
}

fn push_outward(angle: f32) -> f32 {
    if angle > 0.0 {
        angle + BRANCH_BIAS
    } else {
        angle - BRANCH_BIAS
    }
}

/// Snaps a planar heading onto the nearest world axis.
pub fn axis_aligned(heading: Vec3) -> Vec3 {
    if heading.x.abs() >= heading.y.abs() {
        Vec3::new(heading.x.signum(), 0.0, 0.0)
    } else {
        Vec3::new(0.0, heading.y.signum(), 0.0)
    }
}

/// Grows a road network over a terrain.
///
/// The grower owns the spatial index and the instance buffers while it
/// runs; [`Grower::finish`] hands them over once growth is done.
pub struct Grower<'a, T: TerrainField, R: Rng> {
    terrain: &'a T,
    cfg: &'a GrowthConfig,
    rng: &'a mut R,
    index: SpatialIndex,
    instances: NetworkInstances,
    coastline_segments: usize,
    max_depth: u32,
}

impl<'a, T: TerrainField, R: Rng> Grower<'a, T, R> {
    pub fn new(terrain: &'a T, cfg: &'a GrowthConfig, rng: &'a mut R) -> Self {
        Self {
            terrain,
            cfg,
            rng,
            index: SpatialIndex::new(cfg.highway_length()),
            instances: NetworkInstances::default(),
            coastline_segments: 0,
            max_depth: 0,
        }
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn instances(&self) -> &NetworkInstances {
        &self.instances
    }

    /// Consumes the grower, returning the grids and the frozen records.
    pub fn finish(self) -> (SpatialIndex, NetworkInstances) {
        (self.index, self.instances)
    }

    /// Highway turtle facing `+Y` at `root`.
    pub fn root_turtle(&self, root: Vec2) -> Turtle {
        Turtle::new(root.extend(0.0), Vec3::Y, self.cfg.highway_dimensions())
    }

    /// Grows from `root` until a cap is reached or every branch has died.
    pub fn run(&mut self, root: Vec2) -> GrowthReport {
        let mut stack: Vec<Turtle> = Vec::new();
        let mut current = Some(self.root_turtle(root));
        let mut iterations = 0;

        let termination = loop {
            if self.cap_reached() {
                break Termination::CapReached;
            }
            let Some(mut turtle) = current.take() else {
                break Termination::Exhausted;
            };
            iterations += 1;

            if turtle.is_highway() {
                self.spawn_highway_branches(&turtle, &mut stack);
            }
            self.spawn_street_spurs(&turtle, &mut stack);

            let layer = if turtle.is_highway() {
                Layer::Highway
            } else {
                Layer::Street
            };
            current = if self.step(&mut turtle, layer).continues() {
                Some(turtle)
            } else {
                stack.pop()
            };
        };

        GrowthReport {
            termination,
            iterations,
            coastline_segments: self.coastline_segments,
            max_depth: self.max_depth,
        }
    }

    fn cap_reached(&self) -> bool {
        self.instances.street_count() >= self.cfg.street_cap
            || self.instances.highway_count() >= self.cfg.highway_cap
    }

    fn layer_full(&self, layer: Layer) -> bool {
        let cap = match layer {
            Layer::Highway => self.cfg.highway_cap,
            Layer::Street => self.cfg.street_cap,
        };
        self.instances.layer(layer).count() >= cap
    }

    fn spawn_highway_branches(&mut self, current: &Turtle, stack: &mut Vec<Turtle>) {
        let (first, second) = branch_angles(
            self.terrain.noise(current.position),
            self.terrain.noise2(current.position),
        );

        for angle in [first, second] {
            let mut branch = current.clone();
            branch.depth += 1;
            branch.rotate(Vec3::Z, angle);
            if self.step(&mut branch, Layer::Highway).continues() {
                stack.push(branch);
            }
        }
    }

    fn spawn_street_spurs(&mut self, current: &Turtle, stack: &mut Vec<Turtle>) {
        let street_scale = self.cfg.street_scale();
        let heading = if self.cfg.checkered {
            axis_aligned(current.orientation)
        } else {
            current.orientation
        };

        for side in [SPUR_ANGLE, -SPUR_ANGLE] {
            let angle = side + self.spur_jitter();

            let mut spur = current.clone();
            spur.depth += 1;
            spur.orientation = heading;
            spur.scale = self.cfg.highway_dimensions() * street_scale;
            spur.street_scale = street_scale;
            spur.rotate(Vec3::Z, angle);

            let outcome = self.step(&mut spur, Layer::Street);
            if self.cfg.continue_streets && outcome.continues() {
                stack.push(spur);
            }
        }
    }

    fn spur_jitter(&mut self) -> f32 {
        let max = self.cfg.street_jitter_degrees;
        if self.cfg.checkered || max <= 0.0 {
            0.0
        } else {
            self.rng.random_range(-max..=max)
        }
    }

    /// Advances `turtle` one step on `layer`, committing what it lays down.
    fn step(&mut self, turtle: &mut Turtle, layer: Layer) -> StepOutcome {
        if self.layer_full(layer) {
            return StepOutcome::Dead;
        }

        let start = turtle.planar_position();
        turtle.advance();
        let stepped = turtle.planar_position();

        if self.accepts(layer, stepped) {
            turtle.retreat();
            return self.place(turtle, Edge::new(start, stepped), layer);
        }

        match layer {
            Layer::Highway => self.cross_coastline(turtle, start),
            Layer::Street => {
                turtle.retreat();
                StepOutcome::Dead
            }
        }
    }

    fn accepts(&self, layer: Layer, pos: Vec2) -> bool {
        match layer {
            Layer::Highway => self.terrain.population_density(pos) > self.cfg.highway_threshold,
            Layer::Street => self.terrain.height_field(pos) > 0.0,
        }
    }

    /// Resolves `candidate` against the grid and commits the result.
    fn place(&mut self, turtle: &mut Turtle, candidate: Edge, layer: Layer) -> StepOutcome {
        let snap_radius = self.cfg.snap_radius(turtle.street_scale);
        let resolution = self.index.query(&candidate, layer, snap_radius);
        let (endpoint, outcome) = match resolution {
            Resolution::Overlapping => return StepOutcome::Dead,
            Resolution::Clear => (candidate.target, StepOutcome::Extended),
            Resolution::Truncated(junction) => (junction, StepOutcome::Extended),
            Resolution::Snapped(junction) => (junction, StepOutcome::Joined),
        };

        self.commit(turtle, Edge::new(candidate.start, endpoint), layer);
        if let Resolution::Truncated(junction) = resolution {
            self.index.commit_junction(junction, layer);
        }

        let step_length = turtle.step_length();
        if resolution != Resolution::Clear {
            turtle.position = candidate.start.extend(turtle.position.z);
            turtle.face_towards(endpoint);
        }
        turtle.position = endpoint.extend(turtle.position.z);
        turtle.scale.y = step_length;

        outcome
    }

    /// Bridges a highway from water onto land with a double-length edge.
    ///
    /// `turtle` has already advanced once from `start` onto a position whose
    /// population was too low.
    fn cross_coastline(&mut self, turtle: &mut Turtle, start: Vec2) -> StepOutcome {
        if self.terrain.height_field(turtle.planar_position()) > 0.0 {
            turtle.retreat();
            return StepOutcome::Dead;
        }

        turtle.advance();
        let landfall = turtle.planar_position();
        if self.terrain.height_field(landfall) <= 0.0 {
            turtle.retreat();
            turtle.retreat();
            return StepOutcome::Dead;
        }

        self.commit(turtle, Edge::new(start, landfall), Layer::Highway);
        turtle.position = landfall.extend(turtle.position.z);
        self.coastline_segments += 1;
        StepOutcome::Coastline
    }

    fn commit(&mut self, turtle: &Turtle, edge: Edge, layer: Layer) {
        let cross_section = Vec2::new(turtle.scale.x, turtle.scale.z);
        let record = InstanceRecord::for_segment(
            edge.start,
            edge.direction(),
            edge.length(),
            cross_section,
            layer,
        );

        self.index.commit(edge, layer);
        self.instances.layer_mut(layer).push(record);
        self.max_depth = self.max_depth.max(turtle.depth);
    }
}
