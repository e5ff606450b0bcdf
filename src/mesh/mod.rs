//! Mesh data model shared by the runtime and bake paths.
//!
//! `MeshData` is a channel-array mesh (positions, normals, two UV-style
//! channels, triangle indices) with submesh ranges. The Pod vertex types in
//! this module are the exact GPU-facing layouts: `SourceVertex` feeds the
//! runtime expansion kernel, `BakeSourceVertex` the bake kernel, and
//! `GeneratedVertex` is what the bake kernel writes back.

pub mod decompose;
pub mod compose;

pub use decompose::{decompose, decompose_runtime};
pub use compose::compose;

use bytemuck::{Pod, Zeroable};

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;

/// Source vertex for the runtime path (position + normal + uv, 32 bytes).
/// Must match `SourceVertex` in grass_layers.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SourceVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Source vertex for the bake path (position only, 12 bytes).
/// Must match `SourceVertex` in grass_bake.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BakeSourceVertex {
    pub position: [f32; 3],
}

/// Vertex produced by the bake kernel (44 bytes).
///
/// `blade_anchor` records the base point of the originating blade so a wind
/// or trample shader can sway the whole blade around it. Must match
/// `GeneratedVertex` in grass_bake.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GeneratedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub blade_anchor: [f32; 3],
}

/// A contiguous triangle range within a mesh.
///
/// `first_vertex..first_vertex + vertex_count` is the vertex range owned by
/// the submesh; `base_vertex` is a global offset added to every stored index
/// in the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubMesh {
    pub index_start: u32,
    pub index_count: u32,
    pub base_vertex: u32,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// Channel-array triangle mesh.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Secondary channel; on baked grass meshes this carries blade anchors.
    pub anchors: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

impl MeshData {
    /// Build a mesh with a single submesh spanning all vertices and indices.
    pub fn single_submesh(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: Vec<u32>,
    ) -> Self {
        let submesh = SubMesh {
            index_start: 0,
            index_count: indices.len() as u32,
            base_vertex: 0,
            first_vertex: 0,
            vertex_count: positions.len() as u32,
        };
        Self {
            positions,
            normals,
            uvs,
            anchors: Vec::new(),
            indices,
            submeshes: vec![submesh],
        }
    }

    /// Number of triangles in the index list
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounding box of all vertex positions
    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_vertex_stride() {
        assert_eq!(std::mem::size_of::<SourceVertex>(), 32);
        assert_eq!(std::mem::size_of::<BakeSourceVertex>(), 12);
        assert_eq!(std::mem::size_of::<GeneratedVertex>(), 44);
    }

    #[test]
    fn test_single_submesh() {
        let mesh = MeshData::single_submesh(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![Vec3::Y; 3],
            vec![Vec2::ZERO; 3],
            vec![0, 1, 2],
        );
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.submeshes.len(), 1);
        assert_eq!(mesh.submeshes[0].vertex_count, 3);
        assert_eq!(mesh.submeshes[0].index_count, 3);
    }

    #[test]
    fn test_local_bounds() {
        let mesh = MeshData::single_submesh(
            vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(2.0, 3.0, -4.0)],
            vec![Vec3::Y; 2],
            vec![Vec2::ZERO; 2],
            vec![],
        );
        let bounds = mesh.local_bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 3.0, 0.0));
    }
}
