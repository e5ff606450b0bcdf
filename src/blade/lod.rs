//! Level-of-detail layer selection.

use crate::blade::settings::GrassSettings;

/// Number of layers to generate at a camera distance.
///
/// The normalized distance over `[lod_min, lod_max]` is clamped to [0, 1],
/// raised to `lod_factor`, and lerped from `max_layers` down to 1. At or
/// below the minimum distance this is exactly `max_layers`; at or beyond the
/// maximum it is exactly 1.
///
/// A degenerate range (`lod_max <= lod_min`) selects `max_layers` for any
/// distance up to the minimum and 1 otherwise.
pub fn layer_count(distance: f32, settings: &GrassSettings) -> u32 {
    let min = settings.lod_min_camera_distance;
    let max = settings.lod_max_camera_distance;
    let layers = settings.max_layers;

    if distance <= min {
        return layers;
    }
    if max <= min || distance >= max {
        return 1;
    }

    let normalized = ((distance - min) / (max - min)).clamp(0.0, 1.0);
    let t = normalized.powf(settings.lod_factor.max(0.0));
    let count = layers as f32 + (1.0 - layers as f32) * t;
    (count.round() as u32).clamp(1, layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(min: f32, max: f32, layers: u32, factor: f32) -> GrassSettings {
        GrassSettings {
            lod_min_camera_distance: min,
            lod_max_camera_distance: max,
            max_layers: layers,
            lod_factor: factor,
            ..Default::default()
        }
    }

    #[test]
    fn test_boundaries() {
        let s = settings(1.0, 20.0, 16, 2.0);
        assert_eq!(layer_count(0.0, &s), 16);
        assert_eq!(layer_count(1.0, &s), 16);
        assert_eq!(layer_count(20.0, &s), 1);
        assert_eq!(layer_count(500.0, &s), 1);
    }

    #[test]
    fn test_monotonic_non_increasing() {
        let s = settings(1.0, 50.0, 16, 2.0);
        let mut prev = u32::MAX;
        let mut d = 0.0;
        while d <= 60.0 {
            let count = layer_count(d, &s);
            assert!(count <= prev, "layers increased at distance {}", d);
            assert!((1..=16).contains(&count));
            prev = count;
            d += 0.25;
        }
    }

    #[test]
    fn test_degenerate_range() {
        // min == max must not divide by zero: max layers at or below the
        // threshold, one layer beyond it.
        let s = settings(5.0, 5.0, 8, 2.0);
        assert_eq!(layer_count(4.0, &s), 8);
        assert_eq!(layer_count(5.0, &s), 8);
        assert_eq!(layer_count(5.001, &s), 1);
    }

    #[test]
    fn test_zero_factor_still_max_at_min() {
        let s = settings(2.0, 10.0, 4, 0.0);
        assert_eq!(layer_count(2.0, &s), 4);
        // With a zero exponent everything past the threshold drops to 1.
        assert_eq!(layer_count(2.5, &s), 1);
    }

    #[test]
    fn test_single_layer_config() {
        let s = settings(1.0, 20.0, 1, 2.0);
        for d in [0.0, 5.0, 30.0] {
            assert_eq!(layer_count(d, &s), 1);
        }
    }
}
