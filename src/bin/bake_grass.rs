//! Grass blade baker binary - bakes blade geometry into a static mesh asset.
//!
//! Usage: cargo run --release --bin bake_grass -- [OPTIONS]
//!
//! Options:
//!   --settings <PATH>  Bake settings JSON (default: built-in defaults)
//!   --mesh <PATH>      Source mesh asset; omitted = generated plane
//!   --plane <N>        Plane resolution when no mesh is given (default: 16)
//!   --out <PATH>       Output asset path (default: assets/grass_blades.swm)
//!   --backend <NAME>   cpu | gpu (default: cpu)

use std::path::PathBuf;
use std::time::Instant;

use glam::{Vec2, Vec3};

use sward::bake::{self, asset, CpuBakeBackend, GpuBakeBackend};
use sward::blade::BakeSettings;
use sward::core::types::Result;
use sward::mesh::MeshData;
use sward::render::GpuContext;

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();
    let settings_path = parse_str_arg(&args, "--settings");
    let mesh_path = parse_str_arg(&args, "--mesh");
    let plane_resolution = parse_u32_arg(&args, "--plane").unwrap_or(16);
    let out_path = PathBuf::from(
        parse_str_arg(&args, "--out").unwrap_or_else(|| "assets/grass_blades.swm".to_string()),
    );
    let backend = parse_str_arg(&args, "--backend").unwrap_or_else(|| "cpu".to_string());

    if let Err(e) = run(settings_path, mesh_path, plane_resolution, &out_path, &backend) {
        log::error!("bake failed: {}", e);
        std::process::exit(1);
    }
}

fn run(
    settings_path: Option<String>,
    mesh_path: Option<String>,
    plane_resolution: u32,
    out_path: &std::path::Path,
    backend: &str,
) -> Result<()> {
    let settings = match settings_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            serde_json::from_str::<BakeSettings>(&json).map_err(|e| {
                sward::core::Error::InvalidArgument(format!("bad settings file {}: {}", path, e))
            })?
        }
        None => BakeSettings::default(),
    };

    let source_mesh = match mesh_path {
        Some(path) => {
            log::info!("loading source mesh from {}", path);
            asset::load_mesh(std::path::Path::new(&path))?
        }
        None => {
            log::info!("using generated {0}x{0} plane as source", plane_resolution);
            plane_mesh(plane_resolution)
        }
    };

    let start = Instant::now();
    let baked = match backend {
        "gpu" => {
            let ctx = GpuContext::new_blocking()?;
            let gpu = GpuBakeBackend::new(&ctx.device, &ctx.queue);
            bake::bake(&gpu, &source_mesh, &settings)?
        }
        "cpu" => bake::bake(&CpuBakeBackend, &source_mesh, &settings)?,
        other => {
            return Err(sward::core::Error::InvalidArgument(format!(
                "unknown backend '{}', expected cpu or gpu",
                other
            )));
        }
    };
    log::info!(
        "baked {} vertices / {} triangles in {:.1?}",
        baked.positions.len(),
        baked.triangle_count(),
        start.elapsed()
    );

    asset::save_mesh(out_path, &baked)?;
    log::info!("saved mesh asset to {}", out_path.display());
    Ok(())
}

/// Flat XZ plane with `resolution`^2 quads in [-0.5, 0.5].
fn plane_mesh(resolution: u32) -> MeshData {
    let resolution = resolution.max(1);
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for z in 0..=resolution {
        for x in 0..=resolution {
            let u = x as f32 / resolution as f32;
            let v = z as f32 / resolution as f32;
            positions.push(Vec3::new(u - 0.5, 0.0, v - 0.5));
            normals.push(Vec3::Y);
            uvs.push(Vec2::new(u, v));
        }
    }

    let stride = resolution + 1;
    for z in 0..resolution {
        for x in 0..resolution {
            let base = z * stride + x;
            indices.extend_from_slice(&[base, base + stride, base + 1]);
            indices.extend_from_slice(&[base + 1, base + stride, base + stride + 1]);
        }
    }

    MeshData::single_submesh(positions, normals, uvs, indices)
}

fn parse_str_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_u32_arg(args: &[String], name: &str) -> Option<u32> {
    parse_str_arg(args, name).and_then(|v| v.parse().ok())
}
