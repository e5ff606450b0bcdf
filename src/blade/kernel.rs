//! Per-triangle expansion kernels (reference implementation).
//!
//! `expand_blade` is the bounded variant: one source triangle becomes one
//! blade of fixed size, written at index-derived offsets. `expand_layers` is
//! the unbounded variant: one source triangle becomes an LOD-selected stack
//! of shell layers appended through an atomic counter. The WGSL kernels in
//! `shaders/` mirror these functions.

use bytemuck::{Pod, Zeroable};

use crate::blade::append::AppendBuffer;
use crate::blade::hash::{hash_to_signed, hash_to_unit, SALT_FACING, SALT_HEIGHT, SALT_WIDTH};
use crate::blade::lod;
use crate::blade::settings::{BakeSettings, GrassSettings};
use crate::core::types::{Mat4, Quat, Vec3};
use crate::mesh::{GeneratedVertex, SourceVertex};

/// One vertex of a runtime layer triangle (32 bytes).
/// Must match `DrawVertex` in grass_layers.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// One runtime output primitive: a normalized layer height ahead of the
/// three vertices of its triangle (100 bytes).
/// Must match `DrawTriangle` in grass_layers.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawTriangle {
    pub height: f32,
    pub vertices: [DrawVertex; 3],
}

/// Monotonic bend easing: 0 at the blade base, 1 at the tip.
///
/// The exact curve is a tunable; any replacement must stay monotonic on
/// [0, 1] and keep the same boundary values so the bend angle is bounded by
/// the configured maximum.
pub fn bend_ease(t: f32, curvature: f32) -> f32 {
    t.powf(curvature.max(0.0))
}

/// Expand one source triangle into one blade.
///
/// `corners` are the already-transformed triangle vertices. Writes exactly
/// `settings.verts_per_blade()` vertices and `settings.indices_per_blade()`
/// indices; the emitted indices are based at `tri_index * verts_per_blade`,
/// so every triangle owns a disjoint output range and the whole expansion is
/// parallel-safe without a counter.
pub fn expand_blade(
    tri_index: u32,
    corners: [Vec3; 3],
    settings: &BakeSettings,
    flip_winding: bool,
    out_vertices: &mut [GeneratedVertex],
    out_indices: &mut [u32],
) {
    let segments = settings.num_blade_segments;
    debug_assert_eq!(out_vertices.len(), settings.verts_per_blade() as usize);
    debug_assert_eq!(out_indices.len(), settings.indices_per_blade() as usize);

    let anchor = (corners[0] + corners[1] + corners[2]) / 3.0;
    // A zero-area triangle still emits a blade; fall back to a vertical up.
    let up = (corners[1] - corners[0])
        .cross(corners[2] - corners[0])
        .try_normalize()
        .unwrap_or(Vec3::Y);

    let facing = hash_to_unit(tri_index, settings.random_seed, SALT_FACING) * std::f32::consts::TAU;
    let height = (settings.height
        + hash_to_signed(tri_index, settings.random_seed, SALT_HEIGHT) * settings.height_variance)
        .max(0.0);
    let width = (settings.width
        + hash_to_signed(tri_index, settings.random_seed, SALT_WIDTH) * settings.width_variance)
        .max(0.0);

    // Blade-local frame: `side` spans the width, `forward` is the face
    // normal of the unbent card.
    let reference = if up.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
    let side0 = up.cross(reference).normalize();
    let side = Quat::from_axis_angle(up, facing) * side0;
    let forward = side.cross(up);

    let max_bend = settings.max_bend_angle_radians();
    let segments_f = segments as f32;

    let row_point = |t: f32| -> (Vec3, Vec3) {
        let bend = Quat::from_axis_angle(side, max_bend * bend_ease(t, settings.curvature));
        let center = anchor + bend * (up * (height * t));
        let normal = bend * forward;
        (center, normal)
    };

    // Rows of two edge vertices from base toward the tip.
    for i in 0..segments {
        let t = i as f32 / segments_f;
        let (center, normal) = row_point(t);
        let half_width = 0.5 * width * (1.0 - t);
        let offset = side * half_width;

        out_vertices[(2 * i) as usize] = GeneratedVertex {
            position: (center - offset).to_array(),
            normal: normal.to_array(),
            uv: [0.0, t],
            blade_anchor: anchor.to_array(),
        };
        out_vertices[(2 * i + 1) as usize] = GeneratedVertex {
            position: (center + offset).to_array(),
            normal: normal.to_array(),
            uv: [1.0, t],
            blade_anchor: anchor.to_array(),
        };
    }

    // Single tip vertex closing the strip.
    let (tip, tip_normal) = row_point(1.0);
    out_vertices[(2 * segments) as usize] = GeneratedVertex {
        position: tip.to_array(),
        normal: tip_normal.to_array(),
        uv: [0.5, 1.0],
        blade_anchor: anchor.to_array(),
    };

    let base = tri_index * settings.verts_per_blade();
    let mut emit = |slot: usize, a: u32, b: u32, c: u32| {
        let (b, c) = if flip_winding { (c, b) } else { (b, c) };
        out_indices[slot * 3] = base + a;
        out_indices[slot * 3 + 1] = base + b;
        out_indices[slot * 3 + 2] = base + c;
    };

    // Two triangles per quad between consecutive rows, one for the tip.
    for i in 0..segments - 1 {
        let left = 2 * i;
        let right = 2 * i + 1;
        emit((2 * i) as usize, left, right, left + 2);
        emit((2 * i + 1) as usize, right, right + 2, left + 2);
    }
    let last_left = 2 * (segments - 1);
    emit(
        (2 * segments - 2) as usize,
        last_left,
        last_left + 1,
        2 * segments,
    );
}

/// Expand one source triangle into its LOD-selected layer stack, appending
/// each layer through the shared counter. Returns how many layers were kept;
/// layers that lose the capacity race are dropped silently.
pub fn expand_layers(
    corners: [SourceVertex; 3],
    local_to_world: &Mat4,
    camera_position: Vec3,
    settings: &GrassSettings,
    out: &AppendBuffer<DrawTriangle>,
) -> u32 {
    let world_positions =
        corners.map(|v| local_to_world.transform_point3(Vec3::from_array(v.position)));
    let world_normals = corners.map(|v| {
        local_to_world
            .transform_vector3(Vec3::from_array(v.normal))
            .try_normalize()
            .unwrap_or(Vec3::Y)
    });

    let centroid = (world_positions[0] + world_positions[1] + world_positions[2]) / 3.0;
    let distance = camera_position.distance(centroid);
    let layers = lod::layer_count(distance, settings);

    let mut kept = 0;
    for layer in 0..layers {
        let normalized = (layer + 1) as f32 / layers as f32;
        let offset = settings.grass_height * normalized;

        let mut vertices = [DrawVertex::zeroed(); 3];
        for i in 0..3 {
            let position = world_positions[i] + world_normals[i] * offset;
            let uv = if settings.use_world_position_uv {
                [
                    position.x * settings.world_position_uv_scale,
                    position.z * settings.world_position_uv_scale,
                ]
            } else {
                corners[i].uv
            };
            vertices[i] = DrawVertex {
                position: position.to_array(),
                normal: world_normals[i].to_array(),
                uv,
            };
        }

        if out.push(DrawTriangle {
            height: normalized,
            vertices,
        }) {
            kept += 1;
        }
    }
    kept
}
