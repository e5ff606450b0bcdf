//! Mesh decomposition into flat source buffers.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::{BakeSourceVertex, MeshData, SourceVertex};

/// Decompose one submesh into self-contained source arrays for the bake
/// kernel.
///
/// Extracts the vertex range owned by the submesh and rebases every index so
/// the output index buffer refers into the compacted vertex array. Produces
/// exactly `submesh.vertex_count` vertices and `submesh.index_count` indices.
pub fn decompose(
    mesh: &MeshData,
    submesh_index: usize,
) -> Result<(Vec<BakeSourceVertex>, Vec<u32>)> {
    let submesh = *mesh.submeshes.get(submesh_index).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "submesh index {} out of range ({} submeshes)",
            submesh_index,
            mesh.submeshes.len()
        ))
    })?;

    let first_vertex = submesh.first_vertex as usize;
    let vertex_end = first_vertex + submesh.vertex_count as usize;
    if vertex_end > mesh.positions.len() {
        return Err(Error::InvalidArgument(format!(
            "submesh vertex range {}..{} exceeds vertex count {}",
            first_vertex,
            vertex_end,
            mesh.positions.len()
        )));
    }

    let index_start = submesh.index_start as usize;
    let index_end = index_start + submesh.index_count as usize;
    if index_end > mesh.indices.len() {
        return Err(Error::InvalidArgument(format!(
            "submesh index range {}..{} exceeds index count {}",
            index_start,
            index_end,
            mesh.indices.len()
        )));
    }

    let vertices: Vec<BakeSourceVertex> = mesh.positions[first_vertex..vertex_end]
        .iter()
        .map(|p| BakeSourceVertex {
            position: p.to_array(),
        })
        .collect();

    // Rebase stored indices onto the compacted vertex array. `base_vertex`
    // is a global offset the mesh may define for this range.
    let rebase = submesh.base_vertex as i64 - submesh.first_vertex as i64;
    let mut indices = Vec::with_capacity(submesh.index_count as usize);
    for &raw in &mesh.indices[index_start..index_end] {
        let rebased = raw as i64 + rebase;
        if rebased < 0 || rebased >= submesh.vertex_count as i64 {
            return Err(Error::InvalidArgument(format!(
                "index {} rebases to {} outside 0..{}",
                raw, rebased, submesh.vertex_count
            )));
        }
        indices.push(rebased as u32);
    }

    Ok((vertices, indices))
}

/// Decompose the whole mesh into runtime source arrays carrying position,
/// normal, and uv per vertex.
pub fn decompose_runtime(mesh: &MeshData) -> Result<(Vec<SourceVertex>, Vec<u32>)> {
    if mesh.normals.len() != mesh.positions.len() || mesh.uvs.len() != mesh.positions.len() {
        return Err(Error::InvalidArgument(format!(
            "channel length mismatch: {} positions, {} normals, {} uvs",
            mesh.positions.len(),
            mesh.normals.len(),
            mesh.uvs.len()
        )));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(Error::InvalidArgument(format!(
            "index count {} is not a multiple of 3",
            mesh.indices.len()
        )));
    }
    if let Some(&bad) = mesh
        .indices
        .iter()
        .find(|&&i| i as usize >= mesh.positions.len())
    {
        return Err(Error::InvalidArgument(format!(
            "index {} outside 0..{}",
            bad,
            mesh.positions.len()
        )));
    }

    let vertices: Vec<SourceVertex> = (0..mesh.positions.len())
        .map(|i| SourceVertex {
            position: mesh.positions[i].to_array(),
            normal: mesh.normals[i].to_array(),
            uv: mesh.uvs[i].to_array(),
        })
        .collect();

    Ok((vertices, mesh.indices.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Vec2, Vec3};
    use crate::mesh::SubMesh;

    fn two_submesh_mesh() -> MeshData {
        // Two quads, one per submesh, stored in a single vertex buffer.
        // The second submesh uses base_vertex to offset its stored indices.
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 1.0),
        ];
        let normals = vec![Vec3::Y; 7];
        let uvs = vec![Vec2::ZERO; 7];
        let indices = vec![
            0, 1, 2, 2, 1, 3, // submesh 0
            0, 1, 2, // submesh 1, stored relative to base_vertex 4
        ];
        MeshData {
            positions,
            normals,
            uvs,
            anchors: Vec::new(),
            indices,
            submeshes: vec![
                SubMesh {
                    index_start: 0,
                    index_count: 6,
                    base_vertex: 0,
                    first_vertex: 0,
                    vertex_count: 4,
                },
                SubMesh {
                    index_start: 6,
                    index_count: 3,
                    base_vertex: 4,
                    first_vertex: 4,
                    vertex_count: 3,
                },
            ],
        }
    }

    #[test]
    fn test_decompose_counts_and_bounds() {
        let mesh = two_submesh_mesh();
        for (si, submesh) in mesh.submeshes.iter().enumerate() {
            let (verts, indices) = decompose(&mesh, si).unwrap();
            assert_eq!(verts.len(), submesh.vertex_count as usize);
            assert_eq!(indices.len(), submesh.index_count as usize);
            for &i in &indices {
                assert!((i as usize) < verts.len());
            }
        }
    }

    #[test]
    fn test_decompose_rebases_second_submesh() {
        let mesh = two_submesh_mesh();
        let (verts, indices) = decompose(&mesh, 1).unwrap();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(verts[0].position, [5.0, 0.0, 0.0]);
        assert_eq!(verts[2].position, [5.0, 0.0, 1.0]);
    }

    #[test]
    fn test_decompose_bad_submesh_index() {
        let mesh = two_submesh_mesh();
        let err = decompose(&mesh, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_decompose_runtime_whole_mesh() {
        let mesh = two_submesh_mesh();
        let (verts, indices) = decompose_runtime(&mesh).unwrap();
        assert_eq!(verts.len(), 7);
        assert_eq!(indices.len(), 9);
        assert_eq!(verts[4].position, [5.0, 0.0, 0.0]);
        assert_eq!(verts[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_decompose_runtime_rejects_channel_mismatch() {
        let mut mesh = two_submesh_mesh();
        mesh.normals.pop();
        assert!(matches!(
            decompose_runtime(&mesh),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decompose_runtime_rejects_out_of_range_index() {
        let mut mesh = two_submesh_mesh();
        mesh.indices[0] = 99;
        assert!(matches!(
            decompose_runtime(&mesh),
            Err(Error::InvalidArgument(_))
        ));
    }
}
