//! Compute and render pipelines for the runtime grass path.

pub mod grass_layers;
pub mod tri_to_vert;
pub mod grass_draw;

pub use grass_layers::GrassLayersPipeline;
pub use tri_to_vert::TriToVertPipeline;
pub use grass_draw::GrassDrawPipeline;

/// Threads per workgroup on the x axis for the expansion kernels. Must match
/// the `@workgroup_size` in grass_layers.wgsl and grass_bake.wgsl.
pub const THREAD_GROUP_SIZE: u32 = 64;

/// Number of workgroups needed to cover `count` items.
pub fn dispatch_size(count: u32) -> u32 {
    count.div_ceil(THREAD_GROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_size_rounds_up() {
        assert_eq!(dispatch_size(0), 0);
        assert_eq!(dispatch_size(1), 1);
        assert_eq!(dispatch_size(64), 1);
        assert_eq!(dispatch_size(65), 2);
        assert_eq!(dispatch_size(640), 10);
    }
}
