//! Procedural ground profile
//!
//! The ground is a flat line with four sine layers subtracted from it, from
//! very large waves down to small bumps. Screen space is used throughout:
//! +y points down, so a smaller `height` is higher ground.

use crate::tuning::{HillLayer, TerrainTuning};

/// Stateless height field: identical x always yields identical height
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    ground_y: f32,
    origin_x: f32,
    layers: [HillLayer; 4],
    slope_probe: f32,
}

impl Terrain {
    pub fn new(tuning: &TerrainTuning) -> Self {
        Self {
            ground_y: tuning.ground_y,
            origin_x: tuning.origin_x,
            layers: tuning.layers,
            slope_probe: tuning.slope_probe,
        }
    }

    /// Ground surface y at world x
    #[inline]
    pub fn height(&self, x: f32) -> f32 {
        let local = x - self.origin_x;
        self.layers.iter().fold(self.ground_y, |y, layer| {
            y - (local * layer.frequency).sin() * layer.amplitude
        })
    }

    /// Ground angle at world x (radians).
    ///
    /// Positive angles run downhill to the right, negative angles uphill.
    #[inline]
    pub fn slope(&self, x: f32) -> f32 {
        let d = self.slope_probe;
        let y1 = self.height(x - d);
        let y2 = self.height(x + d);
        (y2 - y1).atan2(d * 2.0)
    }

    /// Unit tangent of the ground at x, pointing right
    #[inline]
    pub fn tangent(&self, x: f32) -> glam::Vec2 {
        crate::direction_from_angle(self.slope(x))
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new(&TerrainTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_height_at_origin_is_ground_line() {
        let terrain = Terrain::default();
        assert!((terrain.height(0.0) - 900.0).abs() < 1e-4);
    }

    #[test]
    fn test_flat_terrain_has_zero_slope() {
        let terrain = Terrain::new(&TerrainTuning::flat(500.0));
        for x in [-1000.0, 0.0, 123.4, 9000.0] {
            assert_eq!(terrain.height(x), 500.0);
            assert_eq!(terrain.slope(x), 0.0);
        }
    }

    #[test]
    fn test_slope_sign_matches_height_change() {
        let terrain = Terrain::default();
        // Heights fall (ground rises) just after the origin: uphill
        assert!(terrain.height(10.0) < terrain.height(0.0));
        assert!(terrain.slope(5.0) < 0.0);
    }

    #[test]
    fn test_origin_shifts_profile() {
        let base = Terrain::default();
        let shifted = Terrain::new(&TerrainTuning {
            origin_x: 250.0,
            ..TerrainTuning::default()
        });
        assert!((shifted.height(1250.0) - base.height(1000.0)).abs() < 1e-3);
    }

    #[test]
    fn test_tangent_is_unit_length() {
        let terrain = Terrain::default();
        assert!((terrain.tangent(777.0).length() - 1.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_height_is_deterministic(x in -50_000.0f32..50_000.0) {
            let a = Terrain::default();
            let b = Terrain::default();
            prop_assert_eq!(a.height(x), b.height(x));
            prop_assert_eq!(a.slope(x), b.slope(x));
        }

        #[test]
        fn prop_height_is_continuous(x in -50_000.0f32..50_000.0, eps in 0.0f32..1.0) {
            let terrain = Terrain::default();
            // Max |dh/dx| is the sum of amplitude * frequency (~1.58)
            let bound = 1.6 * eps + 0.05;
            prop_assert!((terrain.height(x + eps) - terrain.height(x)).abs() <= bound);
        }

        #[test]
        fn prop_height_stays_in_band(x in -50_000.0f32..50_000.0) {
            let h = Terrain::default().height(x);
            prop_assert!(h >= 900.0 - 440.0 - 1e-2 && h <= 900.0 + 440.0 + 1e-2);
        }
    }
}
