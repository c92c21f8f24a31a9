use glam::Vec2;

/// Slack allowed past a segment's bounding interval when accepting an
/// intersection point.
const BOUNDS_EPS: f32 = 1e-7;

/// A committed straight road segment.
///
/// Edges are plain values: the spatial grid stores copies, never
/// references, so mirroring an edge into a second layer cannot alias.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub start: Vec2,
    pub target: Vec2,
    pub midpoint: Vec2,
}

impl Edge {
    pub fn new(start: Vec2, target: Vec2) -> Self {
        Self {
            start,
            target,
            midpoint: (start + target) * 0.5,
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.start.distance(self.target)
    }

    /// Unit direction from `start` to `target`, or zero for a degenerate edge.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        (self.target - self.start).normalize_or_zero()
    }

    /// Same start, with the target pushed out to `factor` times the length.
    pub fn extended(&self, factor: f32) -> Self {
        Self::new(self.start, self.start + (self.target - self.start) * factor)
    }

    /// Returns the point where this segment crosses `other`, if any.
    ///
    /// Parallel and collinear segments never intersect. The solved point
    /// must fall inside both segments' bounding intervals on both axes,
    /// with [`BOUNDS_EPS`] of slack.
    pub fn intersects_with(&self, other: &Edge) -> Option<Vec2> {
        let (x1, y1) = (self.start.x, self.start.y);
        let (x2, y2) = (self.target.x, self.target.y);
        let (x3, y3) = (other.start.x, other.start.y);
        let (x4, y4) = (other.target.x, other.target.y);

        let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if denom == 0.0 {
            return None;
        }

        let a = x1 * y2 - y1 * x2;
        let b = x3 * y4 - y3 * x4;
        let x = (a * (x3 - x4) - (x1 - x2) * b) / denom;
        let y = (a * (y3 - y4) - (y1 - y2) * b) / denom;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let inside = within(x1, x2, x)
            && within(y1, y2, y)
            && within(x3, x4, x)
            && within(y3, y4, y);
        inside.then_some(Vec2::new(x, y))
    }
}

#[inline]
fn within(a: f32, b: f32, value: f32) -> bool {
    a.min(b) - BOUNDS_EPS <= value && value <= a.max(b) + BOUNDS_EPS
}
