//! Per-frame indirect rendering orchestrator.
//!
//! Owns the full buffer and pipeline set for one grass surface. Constructing
//! a renderer performs the one-time setup (decompose, allocate, immutable
//! upload); each frame `encode` records the strictly ordered compute
//! sequence and `draw` issues the indirect draw inside the host's render
//! pass. Dropping the renderer releases everything; `rebuild` is a full
//! teardown followed by a fresh setup, never a partial re-initialization.
//!
//! A device fault mid-frame is not locally recoverable here: it shows up as
//! missing or stale grass for that frame, and the frame loop carries on.

use crate::blade::settings::GrassSettings;
use crate::core::error::Error;
use crate::core::types::{Mat4, Result};
use crate::math::Aabb;
use crate::mesh::{self, MeshData};
use crate::render::buffer::GrassBuffers;
use crate::render::frame::FrameContext;
use crate::render::pipeline::{
    grass_draw::GrassDrawUniform, grass_layers::GrassLayersUniform, GrassDrawPipeline,
    GrassLayersPipeline, TriToVertPipeline,
};

pub struct GrassRenderer {
    settings: GrassSettings,
    buffers: GrassBuffers,
    layers: GrassLayersPipeline,
    tri_to_vert: TriToVertPipeline,
    draw: GrassDrawPipeline,
    /// Local bounds of the source mesh, already expanded by the grass
    /// height.
    local_bounds: Aabb,
}

impl GrassRenderer {
    /// Set up the renderer for one source mesh: validate, decompose,
    /// allocate, and upload the immutable source buffers.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source_mesh: &MeshData,
        settings: GrassSettings,
        target_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Result<Self> {
        settings.validate()?;
        let (vertices, indices) = mesh::decompose_runtime(source_mesh)?;
        if indices.is_empty() {
            return Err(Error::InvalidArgument(
                "source mesh has no triangles".into(),
            ));
        }

        let buffers = GrassBuffers::new(device, queue, &vertices, &indices, settings.max_layers);
        let layers = GrassLayersPipeline::new(device, &buffers);
        let tri_to_vert = TriToVertPipeline::new(device, &buffers);
        let draw = GrassDrawPipeline::new(device, &buffers, target_format, depth_format);

        let local_bounds = source_mesh
            .local_bounds()
            .expand_uniform(settings.grass_height);

        log::info!(
            "grass renderer ready: {} source triangles, {} max layers, capacity {}",
            buffers.num_triangles(),
            settings.max_layers,
            buffers.capacity()
        );

        Ok(Self {
            settings,
            buffers,
            layers,
            tri_to_vert,
            draw,
            local_bounds,
        })
    }

    /// Record one frame of generation work, in queue order: reset the append
    /// counter, refresh the per-frame uniforms, dispatch the expansion,
    /// copy the primitive count into the indirect args, convert it to a
    /// vertex count. The draw issued later this frame consumes the result
    /// without any CPU synchronization.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameContext,
    ) {
        self.buffers.reset_counter(encoder);

        let uniform = GrassLayersUniform::new(
            &self.settings,
            self.buffers.num_triangles(),
            self.buffers.capacity(),
            frame.camera_position,
            &frame.local_to_world,
        );
        self.layers.update_params(queue, &uniform);
        self.draw.update_params(
            queue,
            &GrassDrawUniform::new(&frame.view_projection, &self.settings.material),
            &frame.trample,
        );

        self.layers.dispatch(encoder, self.buffers.num_triangles());
        self.buffers.copy_count_to_args(encoder);
        self.tri_to_vert.dispatch(encoder);
    }

    /// Issue the indirect draw inside the host's render pass. Must run after
    /// the commands recorded by `encode` on the same queue.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw.draw(pass, &self.buffers);
    }

    /// World-space bounds for this frame: the expanded local box pushed
    /// through the transform, enclosing conservatively rather than tightly.
    pub fn world_bounds(&self, local_to_world: &Mat4) -> Aabb {
        self.local_bounds.transformed_abs(local_to_world)
    }

    /// Full teardown followed by a fresh setup. Consumes the renderer so
    /// every buffer and pipeline is released before reallocation; a partial
    /// re-initialization could leave buffers bound to stale parameters.
    pub fn rebuild(
        self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source_mesh: &MeshData,
        settings: GrassSettings,
        target_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Result<Self> {
        drop(self);
        Self::new(
            device,
            queue,
            source_mesh,
            settings,
            target_format,
            depth_format,
        )
    }

    pub fn settings(&self) -> &GrassSettings {
        &self.settings
    }

    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }
}
