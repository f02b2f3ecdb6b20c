//! Axis-aligned bounding boxes

use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    pub fn center(&self) -> Vec3 {
        // Halve first so boxes near the f32 range do not overflow.
        self.min * 0.5 + self.max * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest edge length along any axis.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after `matrix` is applied to all eight corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners();
        let first = matrix.transform_point3(corners[0]);
        let mut out = Aabb::new(first, first);
        for corner in &corners[1..] {
            out.expand(matrix.transform_point3(*corner));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_extent() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 4.0, 3.0));
        assert_eq!(aabb.center(), Vec3::new(0.0, 2.0, 2.5));
        assert_eq!(aabb.max_extent(), 4.0);
    }

    #[test]
    fn transformed_box_follows_translation_and_scale() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(10.0, 0.0, 0.0),
        );
        let moved = aabb.transformed(&matrix);
        assert_eq!(moved.min, Vec3::new(8.0, -2.0, -2.0));
        assert_eq!(moved.max, Vec3::new(12.0, 2.0, 2.0));
    }
}
