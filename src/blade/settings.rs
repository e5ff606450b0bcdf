//! User-facing generation settings.
//!
//! Two immutable configuration records: `BakeSettings` drives the offline
//! bounded expansion, `GrassSettings` the per-frame runtime path. Both are
//! serde-derived so tools can load them from JSON.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Mat4, Quat, Result, Vec3};

/// Settings for the offline blade bake.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakeSettings {
    /// Submesh of the source mesh to extrude blades from.
    pub source_submesh_index: usize,
    /// Scale applied to the source mesh before generation.
    pub scale: [f32; 3],
    /// Rotation applied to the source mesh before generation. Euler angles,
    /// in degrees.
    pub rotation: [f32; 3],
    /// Seed for the per-blade random function.
    pub random_seed: u32,
    /// Segments per blade. Must be greater than zero.
    pub num_blade_segments: u32,
    /// Curvature shape of a blade; exponent of the bend easing.
    pub curvature: f32,
    /// Maximum bend angle of a blade, in degrees.
    pub max_bend_angle: f32,
    /// Blade height and its variance.
    pub height: f32,
    pub height_variance: f32,
    /// Blade width and its variance.
    pub width: f32,
    pub width_variance: f32,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            source_submesh_index: 0,
            scale: [1.0, 1.0, 1.0],
            rotation: [0.0, 0.0, 0.0],
            random_seed: 0,
            num_blade_segments: 3,
            curvature: 1.0,
            max_bend_angle: 30.0,
            height: 0.5,
            height_variance: 0.1,
            width: 0.04,
            width_variance: 0.01,
        }
    }
}

impl BakeSettings {
    /// Validate before any dispatch. A zero segment count would produce a
    /// negative generated-index count, so it is rejected up front.
    pub fn validate(&self) -> Result<()> {
        if self.num_blade_segments == 0 {
            return Err(Error::InvalidArgument(
                "num_blade_segments must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The scale+rotation matrix applied to source geometry once per run.
    pub fn transform(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            glam::EulerRot::YXZ,
            self.rotation[1].to_radians(),
            self.rotation[0].to_radians(),
            self.rotation[2].to_radians(),
        );
        Mat4::from_scale_rotation_translation(Vec3::from_array(self.scale), rotation, Vec3::ZERO)
    }

    /// Whether the transform mirrors geometry, requiring a winding flip to
    /// keep generated winding consistent with the transformed source.
    pub fn winding_flipped(&self) -> bool {
        let m = self.transform();
        glam::Mat3::from_mat4(m).determinant() < 0.0
    }

    /// Maximum bend angle in radians.
    pub fn max_bend_angle_radians(&self) -> f32 {
        self.max_bend_angle.to_radians()
    }

    /// Vertices emitted per blade: two per segment plus the tip.
    pub fn verts_per_blade(&self) -> u32 {
        2 * self.num_blade_segments + 1
    }

    /// Triangles emitted per blade: a strip collapsed to a tip.
    pub fn tris_per_blade(&self) -> u32 {
        2 * self.num_blade_segments - 1
    }

    /// Index count emitted per blade.
    pub fn indices_per_blade(&self) -> u32 {
        self.tris_per_blade() * 3
    }
}

/// Material parameters for the runtime draw, owned per renderer instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrassMaterial {
    /// Color at the base of the layer stack.
    pub base_color: [f32; 4],
    /// Color at the top of the layer stack.
    pub tip_color: [f32; 4],
}

impl Default for GrassMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.05, 0.2, 0.02, 1.0],
            tip_color: [0.5, 0.9, 0.3, 1.0],
        }
    }
}

/// Settings for the per-frame runtime path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrassSettings {
    /// Total height of the grass layer stack.
    pub grass_height: f32,
    /// Maximum number of layers. Must be at least one.
    pub max_layers: u32,
    /// Distance from the camera at which LOD starts to take effect.
    pub lod_min_camera_distance: f32,
    /// Distance at which grass reaches the fewest possible layers.
    pub lod_max_camera_distance: f32,
    /// Power applied to the distance lerp to control layer falloff.
    pub lod_factor: f32,
    /// Use world position XZ as the UV. Useful for tiling.
    pub use_world_position_uv: bool,
    /// Multiplier on world position when used as a UV.
    pub world_position_uv_scale: f32,
    /// Draw material block.
    pub material: GrassMaterial,
}

impl Default for GrassSettings {
    fn default() -> Self {
        Self {
            grass_height: 0.5,
            max_layers: 16,
            lod_min_camera_distance: 1.0,
            lod_max_camera_distance: 20.0,
            lod_factor: 2.0,
            use_world_position_uv: false,
            world_position_uv_scale: 1.0,
            material: GrassMaterial::default(),
        }
    }
}

impl GrassSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_layers == 0 {
            return Err(Error::InvalidArgument(
                "max_layers must be at least one".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        BakeSettings::default().validate().unwrap();
        GrassSettings::default().validate().unwrap();
    }

    #[test]
    fn test_zero_segments_rejected() {
        let settings = BakeSettings {
            num_blade_segments: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_layers_rejected() {
        let settings = GrassSettings {
            max_layers: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_per_blade_counts() {
        let settings = BakeSettings {
            num_blade_segments: 2,
            ..Default::default()
        };
        assert_eq!(settings.verts_per_blade(), 5);
        assert_eq!(settings.tris_per_blade(), 3);
        assert_eq!(settings.indices_per_blade(), 9);

        let one = BakeSettings {
            num_blade_segments: 1,
            ..Default::default()
        };
        assert_eq!(one.verts_per_blade(), 3);
        assert_eq!(one.tris_per_blade(), 1);
    }

    #[test]
    fn test_identity_transform_keeps_winding() {
        let settings = BakeSettings::default();
        assert!(!settings.winding_flipped());
    }

    #[test]
    fn test_mirror_scale_flips_winding() {
        let settings = BakeSettings {
            scale: [-1.0, 1.0, 1.0],
            ..Default::default()
        };
        assert!(settings.winding_flipped());
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = BakeSettings {
            random_seed: 99,
            num_blade_segments: 4,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: BakeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.random_seed, 99);
        assert_eq!(back.num_blade_segments, 4);
    }
}
