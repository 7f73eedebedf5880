//! Vertical and horizontal scale handling.
//!
//! The host terrain has a physical height `S`; every absolute elevation in the
//! configuration (base plateau, island heights, noise amplitude) is divided by
//! it so the grid itself only ever holds normalized values.

use serde::{Deserialize, Serialize};

/// Grid extent divided by this gives the spatial period used by noise
/// sampling. Shared by every generator so features line up visually.
pub const FEATURE_DIVISOR: f64 = 25.0;

/// Host vertical scale (world units per normalized elevation unit).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerticalScale {
    pub units: f32,
}

impl VerticalScale {
    pub fn new(units: f32) -> Self {
        Self { units }
    }

    /// Convert an absolute elevation (world units) into grid units.
    pub fn normalize(&self, absolute: f32) -> f32 {
        absolute / self.units
    }

    /// Convert a grid value back into world units.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        normalized * self.units
    }

    pub fn is_valid(&self) -> bool {
        self.units.is_finite() && self.units > 0.0
    }
}

impl Default for VerticalScale {
    fn default() -> Self {
        Self::new(600.0)
    }
}

/// Noise period for a grid extent: `extent / divisor`, never zero.
pub fn feature_scale(extent: usize, divisor: f64) -> f64 {
    (extent as f64 / divisor).max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_round_trip_point() {
        let scale = VerticalScale::new(600.0);
        assert_eq!(scale.normalize(60.0), 0.1);
        assert_eq!(scale.denormalize(0.5), 300.0);
    }

    #[test]
    fn test_feature_scale() {
        assert_eq!(feature_scale(500, FEATURE_DIVISOR), 20.0);
        assert!(feature_scale(0, FEATURE_DIVISOR) > 0.0);
    }

    #[test]
    fn test_invalid_scales() {
        assert!(!VerticalScale::new(0.0).is_valid());
        assert!(!VerticalScale::new(-3.0).is_valid());
        assert!(!VerticalScale::new(f32::NAN).is_valid());
        assert!(VerticalScale::default().is_valid());
    }
}
