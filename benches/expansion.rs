use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::{Mat4, Vec2, Vec3};

use sward::blade::cpu::{expand_bake, expand_runtime};
use sward::blade::{AppendBuffer, BakeSettings, GrassSettings};
use sward::mesh::{self, MeshData};

/// Flat plane with `quads`^2 quads (2 triangles each).
fn plane_mesh(quads: u32) -> MeshData {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for z in 0..=quads {
        for x in 0..=quads {
            positions.push(Vec3::new(x as f32, 0.0, z as f32));
            normals.push(Vec3::Y);
            uvs.push(Vec2::new(x as f32, z as f32));
        }
    }
    let stride = quads + 1;
    for z in 0..quads {
        for x in 0..quads {
            let base = z * stride + x;
            indices.extend_from_slice(&[base, base + stride, base + 1]);
            indices.extend_from_slice(&[base + 1, base + stride, base + stride + 1]);
        }
    }
    MeshData::single_submesh(positions, normals, uvs, indices)
}

fn bench_bake_expansion(c: &mut Criterion) {
    let mesh = plane_mesh(32); // 2048 triangles
    let (vertices, indices) = mesh::decompose(&mesh, 0).unwrap();
    let settings = BakeSettings {
        num_blade_segments: 3,
        ..Default::default()
    };

    c.bench_function("bake_expand_2048_tris", |b| {
        b.iter(|| {
            expand_bake(
                black_box(&vertices),
                black_box(&indices),
                black_box(&settings),
            )
            .unwrap()
        });
    });
}

fn bench_runtime_expansion(c: &mut Criterion) {
    let mesh = plane_mesh(32); // 2048 triangles
    let (vertices, indices) = mesh::decompose_runtime(&mesh).unwrap();
    let settings = GrassSettings {
        max_layers: 8,
        lod_min_camera_distance: 10.0,
        lod_max_camera_distance: 60.0,
        ..Default::default()
    };
    let capacity = mesh.triangle_count() * settings.max_layers as usize;

    c.bench_function("runtime_expand_2048_tris", |b| {
        b.iter(|| {
            let out = AppendBuffer::new(capacity);
            expand_runtime(
                black_box(&vertices),
                black_box(&indices),
                black_box(&settings),
                &Mat4::IDENTITY,
                Vec3::new(16.0, 2.0, 16.0),
                &out,
            )
            .unwrap();
            out.len()
        });
    });
}

criterion_group!(benches, bench_bake_expansion, bench_runtime_expansion);
criterion_main!(benches);
