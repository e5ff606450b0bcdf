//! Buffer set for the runtime grass path.
//!
//! Source buffers are uploaded once and never written again. The draw buffer
//! is an append buffer: a fixed-capacity storage array gated by an atomic
//! counter the expansion kernel reserves slots from. The indirect args
//! buffer feeds the draw call; its count slot is filled on the GPU timeline
//! by copying the counter and multiplying by three in the tri-to-vert pass.

use bytemuck::{Pod, Zeroable};

use crate::blade::kernel::DrawTriangle;
use crate::mesh::SourceVertex;

/// Arguments for a non-indexed indirect draw (16 bytes).
/// Layout: vertex count, instance count, first vertex, first instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct IndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

impl IndirectArgs {
    /// Args for drawing `triangle_count` triangles in a single instance.
    pub fn for_triangle_count(triangle_count: u32) -> Self {
        Self {
            vertex_count: triangle_count * 3,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        }
    }
}

/// All buffers owned by one grass renderer instance.
pub struct GrassBuffers {
    source_vertices: wgpu::Buffer,
    source_indices: wgpu::Buffer,
    draw: wgpu::Buffer,
    counter: wgpu::Buffer,
    args: wgpu::Buffer,
    num_triangles: u32,
    capacity: u32,
}

impl GrassBuffers {
    /// Allocate all buffers and perform the one-time immutable upload of the
    /// source geometry. Capacity is `num_triangles * max_layers` primitives.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[SourceVertex],
        indices: &[u32],
        max_layers: u32,
    ) -> Self {
        let num_triangles = (indices.len() / 3) as u32;
        let capacity = num_triangles * max_layers;

        let source_vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_source_vertices"),
            size: std::mem::size_of_val(vertices) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&source_vertices, 0, bytemuck::cast_slice(vertices));

        let source_indices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_source_indices"),
            size: std::mem::size_of_val(indices) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&source_indices, 0, bytemuck::cast_slice(indices));

        let draw = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_draw_buffer"),
            size: capacity as u64 * std::mem::size_of::<DrawTriangle>() as u64,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let counter = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_draw_counter"),
            size: std::mem::size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let args = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_indirect_args"),
            size: std::mem::size_of::<IndirectArgs>() as u64,
            usage: wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Vertex count is filled per frame; instance count stays 1 forever.
        queue.write_buffer(
            &args,
            0,
            bytemuck::bytes_of(&IndirectArgs {
                vertex_count: 0,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            }),
        );

        log::debug!(
            "grass buffers: {} source triangles, capacity {} primitives",
            num_triangles,
            capacity
        );

        Self {
            source_vertices,
            source_indices,
            draw,
            counter,
            args,
            num_triangles,
            capacity,
        }
    }

    /// Zero the append counter. Must run before the expansion dispatch each
    /// frame.
    pub fn reset_counter(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.clear_buffer(&self.counter, 0, None);
    }

    /// Copy the primitive count into the vertex-count slot of the args
    /// buffer, on the GPU timeline. Tri-to-vert then scales it in place.
    pub fn copy_count_to_args(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(
            &self.counter,
            0,
            &self.args,
            0,
            std::mem::size_of::<u32>() as u64,
        );
    }

    pub fn source_vertices(&self) -> &wgpu::Buffer {
        &self.source_vertices
    }

    pub fn source_indices(&self) -> &wgpu::Buffer {
        &self.source_indices
    }

    pub fn draw(&self) -> &wgpu::Buffer {
        &self.draw
    }

    pub fn counter(&self) -> &wgpu::Buffer {
        &self.counter
    }

    pub fn args(&self) -> &wgpu::Buffer {
        &self.args
    }

    pub fn num_triangles(&self) -> u32 {
        self.num_triangles
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}
