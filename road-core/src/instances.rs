//! Per-layer instance records for drawing committed edges.
//!
//! Every accepted edge produces one record: a translation at the segment
//! midpoint, a rotation taking the canonical `+Y` axis onto the segment
//! direction, an anisotropic scale whose `y` is the segment length, and
//! the layer color. Records are appended by the grower and frozen into a
//! [`NetworkInstances`] snapshot once growth finishes.

use crate::types::Layer;
use glam::{Quat, Vec2, Vec3, Vec4};

pub const HIGHWAY_COLOR: Vec4 = Vec4::new(0.05, 0.05, 0.05, 1.0);
pub const STREET_COLOR: Vec4 = Vec4::new(0.3, 0.3, 0.3, 1.0);

/// Color every record of `layer` is drawn with.
pub fn layer_color(layer: Layer) -> Vec4 {
    match layer {
        Layer::Highway => HIGHWAY_COLOR,
        Layer::Street => STREET_COLOR,
    }
}

/// One drawable segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceRecord {
    pub translate: Vec3,
    pub rotate: Quat,
    pub scale: Vec3,
    pub color: Vec4,
}

impl InstanceRecord {
    /// Record for a segment leaving `start` along the unit `direction`.
    ///
    /// ### Parameters
    /// - `start` - Segment start in the plane.
    /// - `direction` - Unit heading of the segment.
    /// - `length` - Segment length, stored as `scale.y`.
    /// - `width_depth` - Cross-section: `x` is width, `y` is depth.
    /// - `layer` - Selects the color.
    pub fn for_segment(
        start: Vec2,
        direction: Vec2,
        length: f32,
        width_depth: Vec2,
        layer: Layer,
    ) -> Self {
        let center = start + direction * (0.5 * length);
        let heading = direction.extend(0.0).normalize_or(Vec3::Y);
        Self {
            translate: center.extend(0.0),
            rotate: Quat::from_rotation_arc(Vec3::Y, heading).normalize(),
            scale: Vec3::new(width_depth.x, length, width_depth.y),
            color: layer_color(layer),
        }
    }

    /// Segment endpoints recovered from the record, in the plane.
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        let half = (self.rotate * Vec3::Y * (0.5 * self.scale.y)).truncate();
        let center = self.translate.truncate();
        (center - half, center + half)
    }
}

/// Append-only parallel arrays for one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerInstances {
    pub translate: Vec<Vec3>,
    pub rotate: Vec<Quat>,
    pub scale: Vec<Vec3>,
    pub color: Vec<Vec4>,
}

impl LayerInstances {
    pub fn push(&mut self, record: InstanceRecord) {
        self.translate.push(record.translate);
        self.rotate.push(record.rotate);
        self.scale.push(record.scale);
        self.color.push(record.color);
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.translate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translate.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<InstanceRecord> {
        Some(InstanceRecord {
            translate: *self.translate.get(index)?,
            rotate: *self.rotate.get(index)?,
            scale: *self.scale.get(index)?,
            color: *self.color.get(index)?,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = InstanceRecord> + '_ {
        (0..self.count()).filter_map(|i| self.get(i))
    }

    /// Translations as `x, y, z` floats.
    pub fn flat_translate(&self) -> Vec<f32> {
        self.translate.iter().flat_map(|t| t.to_array()).collect()
    }

    /// Rotations as `x, y, z, w` floats.
    pub fn flat_rotate(&self) -> Vec<f32> {
        self.rotate.iter().flat_map(|q| q.to_array()).collect()
    }

    /// Scales as `x, y, z, 1` floats.
    pub fn flat_scale(&self) -> Vec<f32> {
        self.scale
            .iter()
            .flat_map(|s| s.extend(1.0).to_array())
            .collect()
    }

    /// Colors as `r, g, b, a` floats.
    pub fn flat_color(&self) -> Vec<f32> {
        self.color.iter().flat_map(|c| c.to_array()).collect()
    }
}

/// Both layers' records, read-only once growth has finished.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkInstances {
    pub highway: LayerInstances,
    pub street: LayerInstances,
}

impl NetworkInstances {
    pub fn layer(&self, layer: Layer) -> &LayerInstances {
        match layer {
            Layer::Highway => &self.highway,
            Layer::Street => &self.street,
        }
    }

    pub(crate) fn layer_mut(&mut self, layer: Layer) -> &mut LayerInstances {
        match layer {
            Layer::Highway => &mut self.highway,
            Layer::Street => &mut self.street,
        }
    }

    pub fn highway_count(&self) -> usize {
        self.highway.count()
    }

    pub fn street_count(&self) -> usize {
        self.street.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn record_sits_at_segment_midpoint() {
        let record = InstanceRecord::for_segment(
            Vec2::new(0.1, 0.2),
            Vec2::X,
            0.4,
            Vec2::new(0.008, 0.0),
            Layer::Highway,
        );
        assert!((record.translate - Vec3::new(0.3, 0.2, 0.0)).length() < EPS);
        assert_eq!(record.scale, Vec3::new(0.008, 0.4, 0.0));
        assert_eq!(record.color, HIGHWAY_COLOR);
    }

    #[test]
    fn rotation_maps_up_axis_onto_direction() {
        for dir in [Vec2::X, Vec2::NEG_Y, Vec2::new(0.6, 0.8), Vec2::Y] {
            let record =
                InstanceRecord::for_segment(Vec2::ZERO, dir, 1.0, Vec2::ZERO, Layer::Street);
            let mapped = record.rotate * Vec3::Y;
            assert!((mapped - dir.extend(0.0)).length() < 1e-4, "{dir:?} -> {mapped:?}");
            assert!((record.rotate.length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn endpoints_round_trip_through_record() {
        let start = Vec2::new(-0.3, 0.5);
        let dir = Vec2::new(0.6, -0.8);
        let record = InstanceRecord::for_segment(start, dir, 0.25, Vec2::ZERO, Layer::Street);

        let (a, b) = record.endpoints();
        assert!((a - start).length() < 1e-4);
        assert!((b - (start + dir * 0.25)).length() < 1e-4);
    }

    #[test]
    fn layer_arrays_stay_parallel() {
        let mut layer = LayerInstances::default();
        assert!(layer.is_empty());

        for i in 0..3 {
            layer.push(InstanceRecord::for_segment(
                Vec2::new(i as f32, 0.0),
                Vec2::Y,
                1.0,
                Vec2::new(0.01, 0.0),
                Layer::Street,
            ));
        }

        assert_eq!(layer.count(), 3);
        assert_eq!(layer.rotate.len(), 3);
        assert_eq!(layer.scale.len(), 3);
        assert_eq!(layer.color.len(), 3);
        assert_eq!(layer.records().count(), 3);
        assert!(layer.get(3).is_none());
    }

    #[test]
    fn flat_buffers_use_gpu_layout() {
        let mut layer = LayerInstances::default();
        layer.push(InstanceRecord::for_segment(
            Vec2::ZERO,
            Vec2::Y,
            2.0,
            Vec2::new(0.5, 0.25),
            Layer::Highway,
        ));

        assert_eq!(layer.flat_translate().len(), 3);
        assert_eq!(layer.flat_rotate().len(), 4);
        assert_eq!(layer.flat_scale(), vec![0.5, 2.0, 0.25, 1.0]);
        assert_eq!(layer.flat_color(), HIGHWAY_COLOR.to_array().to_vec());
    }
}
