//! Spawn-point placement via ring/circle-intersection packing.
//!
//! Produces a naturally uneven scattering of 2D points inside a square: two
//! families of concentric rings grow from offset centers, and every pair of
//! intersecting rings contributes an intersection point. Staggering every
//! n-th ring breaks up the remaining regularity. Consumers turn the points
//! into spawn transforms for grass patch instances.

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementSettings {
    /// Half side length of the square spawn area.
    pub area_half_length: f32,
    /// Rings per family.
    pub num_rings: u32,
    /// Radius step between consecutive rings.
    pub ring_radius_increment: f32,
    /// Every n-th ring of the opposite family is staggered.
    pub stagger_ring_modulo: u32,
    /// Radius offset applied to staggered rings.
    pub stagger_ring_offset: f32,
    /// Horizontal offset of the first ring family's center from the area
    /// corner.
    pub circle_center_offset: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            area_half_length: 5.0,
            num_rings: 48,
            ring_radius_increment: 0.35,
            stagger_ring_modulo: 2,
            stagger_ring_offset: 0.18,
            circle_center_offset: 0.5,
        }
    }
}

/// Generate spawn points inside the square bounds.
pub fn spawn_points(settings: &PlacementSettings) -> Vec<Vec2> {
    let s = settings;
    let half = s.area_half_length;
    let circle_a_center = Vec2::new(-half - s.circle_center_offset, -half);
    let center_delta = Vec2::new(0.0, half * 2.0);
    let center_distance = center_delta.length();

    let ring_radius = |ring: u32, other_ring: u32| -> f32 {
        let staggered =
            s.stagger_ring_modulo != 0 && other_ring % s.stagger_ring_modulo == 0;
        ring as f32 * s.ring_radius_increment
            + if staggered { s.stagger_ring_offset } else { 0.0 }
    };

    let mut points = Vec::new();
    for ring_a in 0..s.num_rings {
        for ring_b in 0..s.num_rings {
            let radius_a = ring_radius(ring_a, ring_b);
            let radius_b = ring_radius(ring_b, ring_a);
            if !circles_intersect(center_distance, radius_a, radius_b) {
                continue;
            }
            let point = intersection_point(
                circle_a_center,
                center_delta,
                center_distance,
                radius_a,
                radius_b,
            );
            if point.x.abs() <= half && point.y.abs() <= half {
                points.push(point);
            }
        }
    }
    points
}

fn circles_intersect(center_distance: f32, radius_a: f32, radius_b: f32) -> bool {
    radius_a + radius_b > center_distance && center_distance > (radius_a - radius_b).abs()
}

/// One of the two intersection points of two circles, by the standard
/// radical-line construction.
fn intersection_point(
    circle_a_center: Vec2,
    center_delta: Vec2,
    center_distance: f32,
    radius_a: f32,
    radius_b: f32,
) -> Vec2 {
    let length = (radius_a * radius_a - radius_b * radius_b + center_distance * center_distance)
        / (2.0 * center_distance);
    let height = (radius_a * radius_a - length * length).max(0.0).sqrt();
    let l_over_d = length / center_distance;
    let h_over_d = height / center_distance;

    Vec2::new(
        l_over_d * center_delta.x + h_over_d * center_delta.y + circle_a_center.x,
        l_over_d * center_delta.y - h_over_d * center_delta.x + circle_a_center.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_intersect() {
        assert!(circles_intersect(1.0, 0.8, 0.8));
        // Too far apart
        assert!(!circles_intersect(3.0, 1.0, 1.0));
        // One inside the other
        assert!(!circles_intersect(0.1, 2.0, 1.0));
    }

    #[test]
    fn test_intersection_point_lies_on_both_circles() {
        let a_center = Vec2::new(0.0, 0.0);
        let delta = Vec2::new(2.0, 0.0);
        let b_center = a_center + delta;
        let p = intersection_point(a_center, delta, delta.length(), 1.5, 1.2);
        assert!((p.distance(a_center) - 1.5).abs() < 1e-5);
        assert!((p.distance(b_center) - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_points_stay_in_bounds() {
        let settings = PlacementSettings::default();
        let points = spawn_points(&settings);
        assert!(!points.is_empty());
        let half = settings.area_half_length;
        for p in &points {
            assert!(p.x.abs() <= half && p.y.abs() <= half, "point {:?} escaped", p);
        }
    }

    #[test]
    fn test_deterministic() {
        let settings = PlacementSettings::default();
        assert_eq!(spawn_points(&settings), spawn_points(&settings));
    }

    #[test]
    fn test_zero_modulo_does_not_panic() {
        let settings = PlacementSettings {
            stagger_ring_modulo: 0,
            num_rings: 8,
            ..Default::default()
        };
        let _ = spawn_points(&settings);
    }
}
