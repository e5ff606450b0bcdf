//! Indirect grass draw pipeline.
//!
//! Non-indexed triangle-list draw with no vertex buffers: the vertex stage
//! pulls from the draw storage buffer by `vertex_index`. The primitive count
//! comes from the indirect args buffer filled by the compute stages, so no
//! CPU round-trip happens anywhere in the frame. Shadow casting is off for
//! this draw; the host's lighting passes shade it like any opaque geometry.

use bytemuck::{Pod, Zeroable};

use crate::blade::settings::GrassMaterial;
use crate::core::types::Mat4;
use crate::render::buffer::GrassBuffers;
use crate::render::frame::TrampleUniform;

/// Uniform for the draw stages (96 bytes, 16-byte aligned).
/// Must match `DrawParams` in grass_draw.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GrassDrawUniform {
    pub view_projection: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub tip_color: [f32; 4],
}

impl GrassDrawUniform {
    pub fn new(view_projection: &Mat4, material: &GrassMaterial) -> Self {
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            base_color: material.base_color,
            tip_color: material.tip_color,
        }
    }
}

pub struct GrassDrawPipeline {
    pipeline: wgpu::RenderPipeline,
    draw_uniform: wgpu::Buffer,
    trample_uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GrassDrawPipeline {
    pub fn new(
        device: &wgpu::Device,
        buffers: &GrassBuffers,
        target_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_draw_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/grass_draw.wgsl").into(),
            ),
        });

        let draw_uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_draw_params"),
            size: std::mem::size_of::<GrassDrawUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let trample_uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_trample_positions"),
            size: std::mem::size_of::<TrampleUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_draw_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Generated triangles, pulled by vertex index
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_draw_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: draw_uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.draw().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: trample_uniform.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_draw_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grass_draw_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - pulled from storage
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Grass layers are visible from both sides
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            draw_uniform,
            trample_uniform,
            bind_group,
        }
    }

    /// Update per-frame draw parameters
    pub fn update_params(
        &self,
        queue: &wgpu::Queue,
        uniform: &GrassDrawUniform,
        trample: &TrampleUniform,
    ) {
        queue.write_buffer(&self.draw_uniform, 0, bytemuck::bytes_of(uniform));
        queue.write_buffer(&self.trample_uniform, 0, bytemuck::bytes_of(trample));
    }

    /// Issue the indirect draw. The vertex count was written by the
    /// tri-to-vert pass earlier on this queue.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, buffers: &GrassBuffers) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw_indirect(buffers.args(), 0);
    }
}
