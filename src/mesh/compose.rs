//! Mesh composition from generated vertex/index arrays.

use crate::core::types::{Vec2, Vec3};
use crate::mesh::{GeneratedVertex, MeshData, SubMesh};

/// Compose generated vertices and indices into a channel-array mesh.
///
/// The interleaved vertex list is split into separate position, normal, uv,
/// and anchor channels; the index list becomes a single triangle-list
/// submesh. Pure transformation, no GPU interaction.
pub fn compose(vertices: &[GeneratedVertex], indices: Vec<u32>) -> MeshData {
    let mut positions = Vec::with_capacity(vertices.len());
    let mut normals = Vec::with_capacity(vertices.len());
    let mut uvs = Vec::with_capacity(vertices.len());
    let mut anchors = Vec::with_capacity(vertices.len());

    for v in vertices {
        positions.push(Vec3::from_array(v.position));
        normals.push(Vec3::from_array(v.normal));
        uvs.push(Vec2::from_array(v.uv));
        anchors.push(Vec3::from_array(v.blade_anchor));
    }

    let submesh = SubMesh {
        index_start: 0,
        index_count: indices.len() as u32,
        base_vertex: 0,
        first_vertex: 0,
        vertex_count: vertices.len() as u32,
    };

    MeshData {
        positions,
        normals,
        uvs,
        anchors,
        indices,
        submeshes: vec![submesh],
    }
}
