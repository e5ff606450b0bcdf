//! Offline bake path.
//!
//! One-shot pipeline: validate settings, decompose the chosen submesh,
//! run the bounded blade expansion on a backend, compose the result into a
//! mesh. Fails fast: any error returns before the next stage runs and no
//! partial mesh escapes.
//!
//! The expansion backend is a trait so the same orchestration runs against
//! the rayon reference implementation and the GPU kernel; the CPU backend
//! also makes the whole path testable without an adapter.

pub mod gpu;
pub mod asset;

pub use gpu::GpuBakeBackend;

use crate::blade::cpu;
use crate::blade::settings::BakeSettings;
use crate::core::types::Result;
use crate::mesh::{self, BakeSourceVertex, GeneratedVertex, MeshData};

/// Executes the bounded blade expansion over decomposed source buffers.
pub trait BakeBackend {
    fn expand(
        &self,
        vertices: &[BakeSourceVertex],
        indices: &[u32],
        settings: &BakeSettings,
    ) -> Result<(Vec<GeneratedVertex>, Vec<u32>)>;
}

/// Rayon-parallel reference backend. Deterministic: output slots are
/// index-derived, so repeated runs are byte-identical.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBakeBackend;

impl BakeBackend for CpuBakeBackend {
    fn expand(
        &self,
        vertices: &[BakeSourceVertex],
        indices: &[u32],
        settings: &BakeSettings,
    ) -> Result<(Vec<GeneratedVertex>, Vec<u32>)> {
        cpu::expand_bake(vertices, indices, settings)
    }
}

/// Run the full bake and return the composed mesh.
pub fn bake(
    backend: &dyn BakeBackend,
    source_mesh: &MeshData,
    settings: &BakeSettings,
) -> Result<MeshData> {
    settings.validate()?;

    let (source_vertices, source_indices) =
        mesh::decompose(source_mesh, settings.source_submesh_index)?;
    let num_triangles = source_indices.len() / 3;

    let (generated_vertices, generated_indices) =
        backend.expand(&source_vertices, &source_indices, settings)?;

    log::info!(
        "baked {} source triangles into {} vertices / {} triangles",
        num_triangles,
        generated_vertices.len(),
        generated_indices.len() / 3
    );

    Ok(mesh::compose(&generated_vertices, generated_indices))
}
