//! Runtime grass expansion compute pipeline (unbounded variant).
//!
//! Each invocation expands one source triangle into its LOD-selected layer
//! stack, reserving output slots through the atomic counter. Mirrors
//! `blade::kernel::expand_layers`.

use bytemuck::{Pod, Zeroable};

use crate::blade::settings::GrassSettings;
use crate::core::types::{Mat4, Vec3};
use crate::render::buffer::GrassBuffers;
use crate::render::pipeline::dispatch_size;

/// Uniform for the expansion kernel (128 bytes, 16-byte aligned).
/// Must match `Params` in grass_layers.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GrassLayersUniform {
    pub local_to_world: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub num_source_triangles: u32,
    // -- 16 bytes --
    pub max_layers: u32,
    pub capacity: u32,
    pub use_world_position_uv: u32,
    pub _pad0: u32,
    // -- 16 bytes --
    pub grass_height: f32,
    pub lod_min_distance: f32,
    pub lod_max_distance: f32,
    pub lod_factor: f32,
    // -- 16 bytes --
    pub world_position_uv_scale: f32,
    pub _pad1: [f32; 3],
    // -- 16 bytes --
}

impl GrassLayersUniform {
    /// Build the per-frame uniform. Static settings and frame-varying camera
    /// and transform all live in one small uniform, rewritten every frame.
    pub fn new(
        settings: &GrassSettings,
        num_source_triangles: u32,
        capacity: u32,
        camera_position: Vec3,
        local_to_world: &Mat4,
    ) -> Self {
        Self {
            local_to_world: local_to_world.to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            num_source_triangles,
            max_layers: settings.max_layers,
            capacity,
            use_world_position_uv: u32::from(settings.use_world_position_uv),
            _pad0: 0,
            grass_height: settings.grass_height,
            lod_min_distance: settings.lod_min_camera_distance,
            lod_max_distance: settings.lod_max_camera_distance,
            lod_factor: settings.lod_factor.max(0.0),
            world_position_uv_scale: settings.world_position_uv_scale,
            _pad1: [0.0; 3],
        }
    }
}

/// Compute pipeline for the runtime layer expansion.
pub struct GrassLayersPipeline {
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GrassLayersPipeline {
    pub fn new(device: &wgpu::Device, buffers: &GrassBuffers) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_layers_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/grass_layers.wgsl").into(),
            ),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_layers_params"),
            size: std::mem::size_of::<GrassLayersUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_layers_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Source geometry, immutable after upload
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Append buffer + counter
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_layers_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.source_vertices().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.source_indices().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.draw().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: buffers.counter().as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_layers_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("grass_layers_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    /// Update the per-frame uniform
    pub fn update_params(&self, queue: &wgpu::Queue, uniform: &GrassLayersUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    /// Dispatch one thread per source triangle
    pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, num_triangles: u32) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("grass_layers_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(dispatch_size(num_triangles), 1, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<GrassLayersUniform>(), 128);
        assert_eq!(std::mem::size_of::<GrassLayersUniform>() % 16, 0);
    }

    #[test]
    fn test_uniform_from_settings() {
        let settings = GrassSettings {
            max_layers: 12,
            lod_factor: -3.0,
            ..Default::default()
        };
        let uniform = GrassLayersUniform::new(
            &settings,
            40,
            480,
            Vec3::new(1.0, 2.0, 3.0),
            &Mat4::IDENTITY,
        );
        assert_eq!(uniform.num_source_triangles, 40);
        assert_eq!(uniform.capacity, 480);
        assert_eq!(uniform.camera_position, [1.0, 2.0, 3.0]);
        // Negative factors are floored at zero before upload.
        assert_eq!(uniform.lod_factor, 0.0);
    }
}
