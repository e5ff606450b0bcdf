//! Per-frame render context.
//!
//! Everything frame-varying the grass renderer consumes is gathered into an
//! explicit `FrameContext` built by the host once per frame, instead of
//! ambient global shader state: camera position, the renderer's
//! local-to-world transform, the view-projection matrix, and the tracked
//! trample positions consumed by the draw shader.

use bytemuck::{Pod, Zeroable};

use crate::core::types::{Mat4, Vec3};

/// Capacity of the tracked-position array. Entries beyond this bound are
/// ignored and the count is clamped.
pub const MAX_TRAMPLE_POSITIONS: usize = 8;

/// GPU uniform holding tracked world positions (144 bytes, 16-byte aligned).
/// Must match `TrampleUniform` in grass_draw.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TrampleUniform {
    /// xyz = world position, w = 1 for live entries, 0 otherwise.
    pub positions: [[f32; 4]; MAX_TRAMPLE_POSITIONS],
    pub count: u32,
    pub _pad: [u32; 3],
}

/// Tracked transforms whose world positions flatten grass around them.
///
/// Hosts register positions of moving objects each frame (or keep a
/// persistent list and update it); `uniform()` clamps to the configured
/// capacity.
#[derive(Clone, Debug, Default)]
pub struct TrampleState {
    tracked: Vec<Vec3>,
}

impl TrampleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Vec3) {
        self.tracked.push(position);
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Pack tracked positions for upload. Entries beyond the capacity are
    /// dropped; the count never exceeds the array length.
    pub fn uniform(&self) -> TrampleUniform {
        let mut uniform = TrampleUniform::zeroed();
        let count = self.tracked.len().min(MAX_TRAMPLE_POSITIONS);
        for (slot, position) in self.tracked.iter().take(count).enumerate() {
            uniform.positions[slot] = [position.x, position.y, position.z, 1.0];
        }
        uniform.count = count as u32;
        uniform
    }
}

/// Frame-varying inputs to the grass renderer.
#[derive(Clone, Debug)]
pub struct FrameContext {
    /// Camera position in world space, for LOD selection.
    pub camera_position: Vec3,
    /// Local-to-world transform of the grass surface.
    pub local_to_world: Mat4,
    /// View-projection matrix for the draw.
    pub view_projection: Mat4,
    /// Tracked positions for the trample effect.
    pub trample: TrampleUniform,
}

impl FrameContext {
    pub fn new(camera_position: Vec3, local_to_world: Mat4, view_projection: Mat4) -> Self {
        Self {
            camera_position,
            local_to_world,
            view_projection,
            trample: TrampleUniform::zeroed(),
        }
    }

    pub fn with_trample(mut self, trample: &TrampleState) -> Self {
        self.trample = trample.uniform();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trample_uniform_size() {
        assert_eq!(std::mem::size_of::<TrampleUniform>(), 144);
        assert_eq!(std::mem::size_of::<TrampleUniform>() % 16, 0);
    }

    #[test]
    fn test_uniform_packs_positions() {
        let mut state = TrampleState::new();
        state.add(Vec3::new(1.0, 2.0, 3.0));
        state.add(Vec3::new(-4.0, 0.0, 4.0));
        let uniform = state.uniform();
        assert_eq!(uniform.count, 2);
        assert_eq!(uniform.positions[0], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.positions[1], [-4.0, 0.0, 4.0, 1.0]);
        assert_eq!(uniform.positions[2], [0.0; 4]);
    }

    #[test]
    fn test_uniform_clamps_to_capacity() {
        let mut state = TrampleState::new();
        for i in 0..20 {
            state.add(Vec3::splat(i as f32));
        }
        let uniform = state.uniform();
        assert_eq!(uniform.count, MAX_TRAMPLE_POSITIONS as u32);
        assert_eq!(uniform.positions[MAX_TRAMPLE_POSITIONS - 1][3], 1.0);
    }

    #[test]
    fn test_frame_context_with_trample() {
        let mut state = TrampleState::new();
        state.add(Vec3::ONE);
        let frame = FrameContext::new(Vec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY)
            .with_trample(&state);
        assert_eq!(frame.trample.count, 1);
    }
}
