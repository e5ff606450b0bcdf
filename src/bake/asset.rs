//! Baked mesh asset persistence.
//!
//! Serialized with rkyv and compressed with LZ4. Saving over an existing
//! asset rewrites the file at the same path rather than replacing it, so
//! anything referencing the asset by path keeps resolving to the new
//! contents.

use std::path::Path;

use rkyv::{Archive, Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};
use crate::mesh::{MeshData, SubMesh};

/// Serializable mesh asset payload.
#[derive(Archive, Deserialize, Serialize)]
struct MeshAssetData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    anchors: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

/// Serialize a mesh to compressed bytes
pub fn serialize_mesh(mesh: &MeshData) -> Result<Vec<u8>> {
    let data = MeshAssetData {
        positions: mesh.positions.iter().map(|v| v.to_array()).collect(),
        normals: mesh.normals.iter().map(|v| v.to_array()).collect(),
        uvs: mesh.uvs.iter().map(|v| v.to_array()).collect(),
        anchors: mesh.anchors.iter().map(|v| v.to_array()).collect(),
        indices: mesh.indices.clone(),
    };

    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&data)
        .map_err(|e| Error::Asset(e.to_string()))?;
    Ok(lz4_flex::compress_prepend_size(&bytes))
}

/// Deserialize a mesh from compressed bytes
pub fn deserialize_mesh(data: &[u8]) -> Result<MeshData> {
    let bytes = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| Error::Asset(format!("LZ4 decompression failed: {}", e)))?;

    let archived = rkyv::access::<ArchivedMeshAssetData, rkyv::rancor::Error>(&bytes)
        .map_err(|e| Error::Asset(e.to_string()))?;
    let data: MeshAssetData = rkyv::deserialize::<MeshAssetData, rkyv::rancor::Error>(archived)
        .map_err(|e| Error::Asset(e.to_string()))?;

    let submesh = SubMesh {
        index_start: 0,
        index_count: data.indices.len() as u32,
        base_vertex: 0,
        first_vertex: 0,
        vertex_count: data.positions.len() as u32,
    };

    Ok(MeshData {
        positions: data.positions.into_iter().map(Vec3::from_array).collect(),
        normals: data.normals.into_iter().map(Vec3::from_array).collect(),
        uvs: data.uvs.into_iter().map(Vec2::from_array).collect(),
        anchors: data.anchors.into_iter().map(Vec3::from_array).collect(),
        indices: data.indices,
        submeshes: vec![submesh],
    })
}

/// Save a mesh asset, overwriting any existing asset at the path in place.
pub fn save_mesh(path: &Path, mesh: &MeshData) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        log::info!("overwriting existing mesh asset at {}", path.display());
    }
    let compressed = serialize_mesh(mesh)?;
    std::fs::write(path, compressed)?;
    Ok(())
}

/// Load a mesh asset from disk
pub fn load_mesh(path: &Path) -> Result<MeshData> {
    let compressed = std::fs::read(path)?;
    deserialize_mesh(&compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> MeshData {
        let mut mesh = MeshData::single_submesh(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![Vec3::Y; 3],
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            vec![0, 1, 2],
        );
        mesh.anchors = vec![Vec3::splat(1.0 / 3.0); 3];
        mesh
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blades.swm");
        let mesh = sample_mesh();

        save_mesh(&path, &mesh).unwrap();
        let loaded = load_mesh(&path).unwrap();

        assert_eq!(loaded.positions, mesh.positions);
        assert_eq!(loaded.normals, mesh.normals);
        assert_eq!(loaded.uvs, mesh.uvs);
        assert_eq!(loaded.anchors, mesh.anchors);
        assert_eq!(loaded.indices, mesh.indices);
        assert_eq!(loaded.submeshes.len(), 1);
    }

    #[test]
    fn test_save_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blades.swm");

        save_mesh(&path, &sample_mesh()).unwrap();

        let mut second = sample_mesh();
        second.positions[0] = Vec3::splat(9.0);
        save_mesh(&path, &second).unwrap();

        // Same path, new contents: references by path stay valid.
        let loaded = load_mesh(&path).unwrap();
        assert_eq!(loaded.positions[0], Vec3::splat(9.0));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_mesh(&dir.path().join("nope.swm"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_corrupt_data_errors() {
        let result = deserialize_mesh(&[1, 2, 3, 4, 5]);
        assert!(matches!(result, Err(Error::Asset(_))));
    }
}
