use glam::{Quat, Vec2, Vec3};

/// `street_scale` at or above this value marks a highway turtle.
pub const HIGHWAY_SCALE_CUTOFF: f32 = 0.9999;

/// An oriented, anisotropically scaled point that advances growth in
/// discrete steps.
///
/// `scale` is `(width, length, depth)`; one [`Turtle::advance`] moves the
/// turtle `scale.y` units along `orientation`. `Clone` gives a fully
/// independent copy, which is how branches are spawned.
#[derive(Clone, Debug, PartialEq)]
pub struct Turtle {
    pub position: Vec3,
    /// Unit heading.
    pub orientation: Vec3,
    pub scale: Vec3,
    /// Number of branchings between the root and this turtle.
    pub depth: u32,
    /// `1.0` for highways, smaller for streets.
    pub street_scale: f32,
}

impl Turtle {
    pub fn new(position: Vec3, orientation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            orientation: orientation.normalize_or_zero(),
            scale,
            depth: 0,
            street_scale: 1.0,
        }
    }

    /// Rotates the heading by `angle_degrees` around `axis`.
    ///
    /// `axis` does not need to be unit length but must not be zero.
    pub fn rotate(&mut self, axis: Vec3, angle_degrees: f32) {
        let axis = axis.normalize_or_zero();
        debug_assert!(axis != Vec3::ZERO, "turtle rotated around a zero axis");
        if axis == Vec3::ZERO {
            return;
        }

        let rotation = Quat::from_axis_angle(axis, angle_degrees.to_radians()).normalize();
        self.orientation = (rotation * self.orientation).normalize();
    }

    /// Moves one step forward.
    #[inline]
    pub fn advance(&mut self) {
        self.position += self.displacement();
    }

    /// Undoes the most recent [`Turtle::advance`].
    ///
    /// Only exact while `orientation` and `scale` are unchanged since then.
    #[inline]
    pub fn retreat(&mut self) {
        self.position -= self.displacement();
    }

    /// Aims the turtle at `target` so that one advance lands on it.
    ///
    /// Leaves the turtle untouched if `target` coincides with its position.
    pub fn face_towards(&mut self, target: Vec2) {
        let offset = target - self.planar_position();
        let length = offset.length();
        if length > 0.0 {
            let dir = offset / length;
            self.orientation = Vec3::new(dir.x, dir.y, 0.0);
            self.scale.y = length;
        }
    }

    #[inline]
    pub fn planar_position(&self) -> Vec2 {
        self.position.truncate()
    }

    #[inline]
    pub fn step_length(&self) -> f32 {
        self.scale.y
    }

    #[inline]
    pub fn is_highway(&self) -> bool {
        self.street_scale >= HIGHWAY_SCALE_CUTOFF
    }

    #[inline]
    fn displacement(&self) -> Vec3 {
        self.orientation * self.scale.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn unit_turtle() -> Turtle {
        Turtle::new(Vec3::ZERO, Vec3::Y, Vec3::new(0.01, 1.0, 0.0))
    }

    #[test]
    fn advance_moves_by_length_along_heading() {
        let mut t = Turtle::new(Vec3::new(1.0, 1.0, 0.0), Vec3::X, Vec3::new(0.0, 2.5, 0.0));
        t.advance();
        assert!((t.position - Vec3::new(3.5, 1.0, 0.0)).length() < EPS);
    }

    #[test]
    fn advance_then_retreat_restores_position() {
        let mut t = unit_turtle();
        t.position = Vec3::new(0.3, -0.7, 0.0);
        t.rotate(Vec3::Z, 37.0);
        let before = t.position;

        t.advance();
        t.retreat();

        assert!((t.position - before).length() < EPS);
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let mut t = unit_turtle();
        t.rotate(Vec3::Z, 90.0);
        assert!((t.orientation - Vec3::new(-1.0, 0.0, 0.0)).length() < EPS);

        t.rotate(Vec3::Z, -180.0);
        assert!((t.orientation - Vec3::X).length() < EPS);
    }

    #[test]
    fn rotate_keeps_orientation_unit_for_non_unit_axis() {
        let mut t = unit_turtle();
        for i in 0..100 {
            t.rotate(Vec3::new(0.0, 0.0, 1e-3), 13.7 * i as f32);
        }
        assert!((t.orientation.length() - 1.0).abs() < EPS);

        t.rotate(Vec3::new(3.0, 4.0, 12.0), 71.0);
        assert!((t.orientation.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn clone_is_independent_of_source() {
        let source = unit_turtle();
        let mut copy = source.clone();

        copy.position += Vec3::new(5.0, 5.0, 0.0);
        copy.rotate(Vec3::Z, 45.0);
        copy.scale.y = 9.0;
        copy.depth += 1;

        assert_eq!(source.position, Vec3::ZERO);
        assert_eq!(source.orientation, Vec3::Y);
        assert_eq!(source.scale, Vec3::new(0.01, 1.0, 0.0));
        assert_eq!(source.depth, 0);
    }

    #[test]
    fn face_towards_lands_on_target() {
        let mut t = unit_turtle();
        let target = Vec2::new(0.3, 0.4);

        t.face_towards(target);
        assert!((t.step_length() - 0.5).abs() < EPS);

        t.advance();
        assert!((t.planar_position() - target).length() < EPS);
    }

    #[test]
    fn face_towards_own_position_is_a_no_op() {
        let mut t = unit_turtle();
        t.face_towards(Vec2::ZERO);
        assert_eq!(t, unit_turtle());
    }

    #[test]
    fn street_scale_selects_mode() {
        let mut t = unit_turtle();
        assert!(t.is_highway());
        t.street_scale = 0.5 / 3.0;
        assert!(!t.is_highway());
    }
}
