//! Axis-aligned bounding box

use crate::core::types::{Mat4, Vec3};

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Build the AABB enclosing a set of points
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut iter = points.into_iter();
        let first = iter.next().unwrap_or(Vec3::ZERO);
        let mut aabb = Aabb::new(first, first);
        for p in iter {
            aabb.expand(p);
        }
        aabb
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Expand AABB to include point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box outward by `amount` on every axis, in both directions
    pub fn expand_uniform(&self, amount: f32) -> Aabb {
        let half = Vec3::splat(amount * 0.5);
        Aabb {
            min: self.min - half,
            max: self.max + half,
        }
    }

    /// Transform the box and return the axis-aligned box enclosing the result.
    ///
    /// The world extents are the component-wise sums of the absolute
    /// transformed local axes, so the result encloses the rotated box rather
    /// than fitting it tightly.
    pub fn transformed_abs(&self, transform: &Mat4) -> Aabb {
        let center = transform.transform_point3(self.center());

        let e = self.half_extent();
        let axis_x = transform.transform_vector3(Vec3::new(e.x, 0.0, 0.0));
        let axis_y = transform.transform_vector3(Vec3::new(0.0, e.y, 0.0));
        let axis_z = transform.transform_vector3(Vec3::new(0.0, 0.0, e.z));

        let half_extent = axis_x.abs() + axis_y.abs() + axis_z.abs();
        Aabb::from_center_half_extent(center, half_extent)
    }
}
