//! GPU bake backend.
//!
//! Dispatches the bounded blade kernel and reads the generated buffers back
//! through staging copies. The readback blocks the calling thread; that is
//! deliberate, this path runs once at editor/tool time, never inside a
//! frame loop.

use bytemuck::{Pod, Zeroable};

use crate::bake::BakeBackend;
use crate::blade::settings::BakeSettings;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::{BakeSourceVertex, GeneratedVertex};
use crate::render::pipeline::dispatch_size;

/// Uniform for the bake kernel (112 bytes, 16-byte aligned).
/// Must match `Params` in grass_bake.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BakeUniform {
    pub transform: [[f32; 4]; 4],
    pub num_source_triangles: u32,
    pub num_blade_segments: u32,
    pub random_seed: u32,
    pub flip_winding: u32,
    // -- 16 bytes --
    pub max_bend_angle: f32,
    pub blade_height: f32,
    pub blade_height_variance: f32,
    pub blade_width: f32,
    // -- 16 bytes --
    pub blade_width_variance: f32,
    pub blade_curvature: f32,
    pub _pad: [f32; 2],
    // -- 16 bytes --
}

impl BakeUniform {
    pub fn new(settings: &BakeSettings, num_source_triangles: u32) -> Self {
        Self {
            transform: settings.transform().to_cols_array_2d(),
            num_source_triangles,
            num_blade_segments: settings.num_blade_segments,
            random_seed: settings.random_seed,
            flip_winding: u32::from(settings.winding_flipped()),
            max_bend_angle: settings.max_bend_angle_radians(),
            blade_height: settings.height,
            blade_height_variance: settings.height_variance,
            blade_width: settings.width,
            blade_width_variance: settings.width_variance,
            blade_curvature: settings.curvature.max(0.0),
            _pad: [0.0; 2],
        }
    }
}

pub struct GpuBakeBackend<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> GpuBakeBackend<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }

    fn read_staging<T: Pod>(&self, staging: &wgpu::Buffer, count: usize) -> Result<Vec<T>> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| Error::Gpu(format!("device poll failed: {:?}", e)))?;

        rx.recv()
            .map_err(|_| Error::Gpu("readback callback dropped".into()))?
            .map_err(|e| Error::Gpu(format!("buffer map failed: {:?}", e)))?;

        let data = slice.get_mapped_range();
        let values = bytemuck::cast_slice::<u8, T>(&data[..])[..count].to_vec();
        drop(data);
        staging.unmap();
        Ok(values)
    }
}

impl BakeBackend for GpuBakeBackend<'_> {
    fn expand(
        &self,
        vertices: &[BakeSourceVertex],
        indices: &[u32],
        settings: &BakeSettings,
    ) -> Result<(Vec<GeneratedVertex>, Vec<u32>)> {
        settings.validate()?;
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidArgument(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }

        let device = self.device;
        let num_triangles = (indices.len() / 3) as u32;
        // Capacity is exact: the expansion factor is fixed, so the kernel
        // can never run out of room.
        let vertex_count = (num_triangles * settings.verts_per_blade()) as usize;
        let index_count = (num_triangles * settings.indices_per_blade()) as usize;
        let vertex_bytes = (vertex_count * std::mem::size_of::<GeneratedVertex>()) as u64;
        let index_bytes = (index_count * std::mem::size_of::<u32>()) as u64;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_bake_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../shaders/grass_bake.wgsl").into(),
            ),
        });

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_params"),
            size: std::mem::size_of::<BakeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let source_vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_source_vertices"),
            size: std::mem::size_of_val(vertices) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let source_indices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_source_indices"),
            size: std::mem::size_of_val(indices) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let generated_vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_generated_vertices"),
            size: vertex_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let generated_indices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_generated_indices"),
            size: index_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let vertex_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_vertex_staging"),
            size: vertex_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_index_staging"),
            size: index_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bake_layout"),
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
            label: Some("bake_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: source_vertices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: source_indices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: generated_vertices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: generated_indices.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bake_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("bake_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        self.queue
            .write_buffer(&source_vertices, 0, bytemuck::cast_slice(vertices));
        self.queue
            .write_buffer(&source_indices, 0, bytemuck::cast_slice(indices));
        self.queue.write_buffer(
            &uniform,
            0,
            bytemuck::bytes_of(&BakeUniform::new(settings, num_triangles)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bake_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("bake_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(dispatch_size(num_triangles), 1, 1);
        }
        encoder.copy_buffer_to_buffer(&generated_vertices, 0, &vertex_staging, 0, vertex_bytes);
        encoder.copy_buffer_to_buffer(&generated_indices, 0, &index_staging, 0, index_bytes);
        self.queue.submit(Some(encoder.finish()));

        log::debug!(
            "bake dispatched: {} triangles, reading back {} vertices",
            num_triangles,
            vertex_count
        );

        let out_vertices = self.read_staging::<GeneratedVertex>(&vertex_staging, vertex_count)?;
        let out_indices = self.read_staging::<u32>(&index_staging, index_count)?;

        Ok((out_vertices, out_indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_uniform_size() {
        assert_eq!(std::mem::size_of::<BakeUniform>(), 112);
        assert_eq!(std::mem::size_of::<BakeUniform>() % 16, 0);
    }

    #[test]
    fn test_bake_uniform_from_settings() {
        let settings = BakeSettings {
            random_seed: 9,
            num_blade_segments: 4,
            curvature: -2.0,
            max_bend_angle: 90.0,
            ..Default::default()
        };
        let uniform = BakeUniform::new(&settings, 128);
        assert_eq!(uniform.num_source_triangles, 128);
        assert_eq!(uniform.num_blade_segments, 4);
        assert_eq!(uniform.flip_winding, 0);
        // Curvature is floored at zero before upload.
        assert_eq!(uniform.blade_curvature, 0.0);
        assert!((uniform.max_bend_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
