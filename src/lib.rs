//! Hexfall - a rotating hexagon brick puzzle
//!
//! Core modules:
//! - `sim`: Polar grid game state (bricks, board, matching, session driver)
//! - `surface`: Rendering surface abstraction consumed by the simulation
//! - `config`: Data-driven board and session tuning
//! - `platform`: Browser glue (SVG surface, frame scheduling)

pub mod config;
pub mod platform;
pub mod sim;
pub mod surface;

pub use config::{BoardConfig, ConfigError, SessionConfig};
pub use surface::{HeadlessSurface, ShapeHandle, Surface};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Number of base edges (hexagon)
    pub const DEFAULT_EDGE_COUNT: u32 = 6;

    /// Board dimensions
    pub const BASE_RADIUS: f32 = 100.0;
    /// Field boundary radius as a multiple of the base radius
    pub const FIELD_RADIUS_FACTOR: f32 = 4.5;

    /// Duration of one base rotation step
    pub const ROTATION_DURATION_MS: f32 = 100.0;

    /// Brick defaults
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_GAP: f32 = 3.0;
    /// Milliseconds per radial unit (higher = slower)
    pub const BRICK_FALL_SPEED: f32 = 5.0;

    /// Delay before a cleared brick's shape is deleted
    pub const REMOVAL_DELAY_MS: f32 = 250.0;

    /// Driver defaults
    pub const SPAWN_INTERVAL_MS: f64 = 1500.0;
    pub const TEST_MODE_FALL_SPEED: f32 = 1.0;

    /// Frame length used when no native animation frame callback exists
    pub const FRAME_FALLBACK_MS: i32 = 16;

    /// Tolerance for comparing stack radii
    pub const RADIUS_EPSILON: f32 = 1e-3;
}

/// Normalize an angle in degrees to [0, 360). Non-finite input yields NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // Tiny negative inputs round up to exactly 360
    if a >= 360.0 { 0.0 } else { a }
}

/// Convert polar (radius, degrees) around `center` to cartesian
#[inline]
pub fn polar_to_cartesian(center: Vec2, radius: f32, angle_deg: f32) -> Vec2 {
    let theta = angle_deg.to_radians();
    Vec2::new(
        center.x + radius * theta.cos(),
        center.y + radius * theta.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_angle_examples() {
        assert_eq!(normalize_angle(-60.0), 300.0);
        assert_eq!(normalize_angle(420.0), 60.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(360.0), 0.0);
        assert_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_normalize_angle_huge_values() {
        for angle in [1e10f32, -1e10, f32::MAX, f32::MIN, -1e-7] {
            let a = normalize_angle(angle);
            assert!((0.0..360.0).contains(&a), "{angle} -> {a}");
        }
        assert!(normalize_angle(f32::INFINITY).is_nan());
        assert!(normalize_angle(f32::NAN).is_nan());
    }

    #[test]
    fn test_polar_to_cartesian() {
        let center = Vec2::new(50.0, 50.0);
        let p = polar_to_cartesian(center, 10.0, 0.0);
        assert!((p - Vec2::new(60.0, 50.0)).length() < 1e-4);

        // Screen coordinates: 90 degrees points down (+y)
        let p = polar_to_cartesian(center, 10.0, 90.0);
        assert!((p - Vec2::new(50.0, 60.0)).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn normalize_angle_in_range(angle in any::<f32>().prop_filter("finite", |a| a.is_finite())) {
            let a = normalize_angle(angle);
            prop_assert!((0.0..360.0).contains(&a));
        }

        #[test]
        fn normalize_angle_idempotent(angle in any::<f32>().prop_filter("finite", |a| a.is_finite())) {
            let a = normalize_angle(angle);
            prop_assert_eq!(normalize_angle(a), a);
        }
    }
}
