//! Sward - GPU-driven procedural grass.
//!
//! Two generation paths over the same source geometry:
//!
//! - **Runtime**: every frame, a compute kernel expands each source triangle
//!   into a camera-distance-dependent stack of layers, appending into a
//!   fixed-capacity buffer through an atomic counter; a second kernel turns
//!   the primitive count into indirect draw arguments, and the grass is
//!   drawn indirectly with no CPU round-trip ([`render::GrassRenderer`]).
//! - **Bake**: a one-shot bounded expansion grows a fixed-size blade per
//!   source triangle, blocks on readback, and composes a static mesh asset
//!   ([`bake::bake`]).
//!
//! The kernels exist twice: in WGSL under `shaders/`, and as pure Rust in
//! [`blade`], where rayon runs them as an in-process backend and the tests
//! pin down determinism, LOD selection, and counter capping.

pub mod core;
pub mod math;
pub mod mesh;
pub mod blade;
pub mod render;
pub mod bake;
pub mod placement;
