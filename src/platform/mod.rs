//! Platform abstraction layer
//!
//! Browser glue for the simulation:
//! - SVG rendering surface
//! - Animation frame scheduling with a timer fallback
//! - Test mode detection from the page URL

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::RotateDirection;

/// Rotation requested by a touch at `x`: left half rotates left, right half right
pub fn touch_direction(x: f32, viewport_width: f32) -> RotateDirection {
    if x < viewport_width / 2.0 {
        RotateDirection::Left
    } else {
        RotateDirection::Right
    }
}
