//! Falling and attached bricks
//!
//! A brick lives in one angular sector and moves only radially. It falls
//! toward the base until it reaches the next free slot of its stack, then
//! attaches. Rotation changes the sector immediately; the visual animation
//! catches up later.

use serde::{Deserialize, Serialize};

use super::wedge::Wedge;
use crate::config::BoardConfig;
use crate::surface::ShapeHandle;

/// Brick colour (also the match key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BrickColor {
    Blue,
    YellowGreen,
    Cyan,
    Purple,
    Orange,
}

impl BrickColor {
    /// Palette order; difficulty levels unlock a growing prefix
    pub const ALL: [BrickColor; 5] = [
        BrickColor::Blue,
        BrickColor::YellowGreen,
        BrickColor::Cyan,
        BrickColor::Purple,
        BrickColor::Orange,
    ];

    /// CSS class used by the SVG surface
    pub fn as_str(&self) -> &'static str {
        match self {
            BrickColor::Blue => "blue",
            BrickColor::YellowGreen => "ygreen",
            BrickColor::Cyan => "cyan",
            BrickColor::Purple => "purple",
            BrickColor::Orange => "orange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrickId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    /// Sign of the angle change (left is counter-clockwise)
    #[inline]
    pub fn signum(self) -> f32 {
        match self {
            RotateDirection::Left => -1.0,
            RotateDirection::Right => 1.0,
        }
    }

    /// Sector index after one step in this direction
    #[inline]
    pub fn next_sector(self, sector: usize, edge_count: usize) -> usize {
        match self {
            RotateDirection::Left => (sector + edge_count - 1) % edge_count,
            RotateDirection::Right => (sector + 1) % edge_count,
        }
    }
}

/// Fall state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FallPhase {
    /// Moving toward the base; `last_tick_ms` is the previous frame time
    Falling { last_tick_ms: f64 },
    /// Resting on the board
    Attached,
}

/// Outcome of advancing a falling brick by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallStep {
    Falling,
    Landed,
}

/// Read-only view of a brick's position in the polar grid
pub trait StackSlot {
    fn sector(&self) -> usize;
    fn radius_position(&self) -> f32;
    fn height(&self) -> f32;
    fn gap(&self) -> f32;

    /// Radial space this brick claims in its stack
    #[inline]
    fn slot_height(&self) -> f32 {
        self.height() + self.gap()
    }
}

/// A wedge-shaped brick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: BrickId,
    pub color: BrickColor,
    sector: usize,
    edge_count: usize,
    /// Outer edge distance from the board center
    radius: f32,
    height: f32,
    gap: f32,
    /// Milliseconds per radial unit (higher = slower)
    pub fall_speed: f32,
    phase: FallPhase,
    /// Cleared to stop at the next tick
    active_falling: bool,
    /// Visual owned by the surface
    pub shape: Option<ShapeHandle>,
}

impl Brick {
    pub fn new(
        id: BrickId,
        color: BrickColor,
        sector: usize,
        radius: f32,
        config: &BoardConfig,
    ) -> Self {
        let edge_count = config.edge_count as usize;
        assert!(
            sector < edge_count,
            "sector {sector} out of range for {edge_count} edges"
        );
        Self {
            id,
            color,
            sector,
            edge_count,
            radius,
            height: config.brick_height,
            gap: config.brick_gap,
            fall_speed: config.fall_speed,
            phase: FallPhase::Attached,
            active_falling: false,
            shape: None,
        }
    }

    pub fn with_fall_speed(mut self, fall_speed: f32) -> Self {
        self.fall_speed = fall_speed;
        self
    }

    /// Angular size of the brick's sector
    #[inline]
    pub fn sector_span(&self) -> f32 {
        360.0 / self.edge_count as f32
    }

    /// Normalized home angle of the brick's sector
    #[inline]
    pub fn angle_position(&self) -> f32 {
        self.sector as f32 * self.sector_span()
    }

    pub fn phase(&self) -> FallPhase {
        self.phase
    }

    pub fn is_attached(&self) -> bool {
        self.phase == FallPhase::Attached
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.phase, FallPhase::Falling { .. })
    }

    pub fn is_active_falling(&self) -> bool {
        self.active_falling
    }

    /// Enter the falling state at `now_ms`
    pub fn start_falling(&mut self, now_ms: f64) {
        self.phase = FallPhase::Falling {
            last_tick_ms: now_ms,
        };
        self.active_falling = true;
    }

    /// Request a stop. Observed at the next [`Brick::advance`].
    pub fn interrupt_fall(&mut self) {
        self.active_falling = false;
    }

    /// Re-base the frame timestamp without moving (used after a pause)
    pub fn resync(&mut self, now_ms: f64) {
        if let FallPhase::Falling { last_tick_ms } = &mut self.phase {
            *last_tick_ms = now_ms;
        }
    }

    /// Move by the time elapsed since the previous frame
    pub fn advance(&mut self, now_ms: f64, min_radius: f32) -> FallStep {
        let FallPhase::Falling { last_tick_ms } = self.phase else {
            return FallStep::Landed;
        };
        let elapsed = (now_ms - last_tick_ms).max(0.0) as f32;
        self.radius -= elapsed / self.fall_speed;
        self.phase = FallPhase::Falling {
            last_tick_ms: now_ms,
        };

        if self.radius > min_radius && self.active_falling {
            FallStep::Falling
        } else {
            FallStep::Landed
        }
    }

    /// Snap to the exact stop radius and attach
    pub fn settle(&mut self, min_radius: f32) {
        self.active_falling = false;
        self.radius = min_radius;
        self.phase = FallPhase::Attached;
    }

    /// Step one sector. Returns the angle delta for the visual animation.
    pub fn rotate(&mut self, direction: RotateDirection) -> f32 {
        self.sector = direction.next_sector(self.sector, self.edge_count);
        direction.signum() * self.sector_span()
    }

    /// Outline at the current logical position
    pub fn wedge(&self) -> Wedge {
        Wedge::for_brick(
            self.radius,
            self.height,
            self.angle_position(),
            self.sector_span(),
        )
    }
}

impl StackSlot for Brick {
    fn sector(&self) -> usize {
        self.sector
    }

    fn radius_position(&self) -> f32 {
        self.radius
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn gap(&self) -> f32 {
        self.gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brick(sector: usize, radius: f32) -> Brick {
        Brick::new(BrickId(1), BrickColor::Blue, sector, radius, &BoardConfig::default())
    }

    #[test]
    fn test_fall_uses_ms_per_unit() {
        let mut b = brick(0, 450.0);
        b.start_falling(0.0);
        // fall_speed 5: 100ms moves 20 units
        assert_eq!(b.advance(100.0, 123.0), FallStep::Falling);
        assert!((b.radius_position() - 430.0).abs() < 1e-4);

        // Slower brick moves less in the same time
        let mut slow = brick(0, 450.0).with_fall_speed(10.0);
        slow.start_falling(0.0);
        slow.advance(100.0, 123.0);
        assert!((slow.radius_position() - 440.0).abs() < 1e-4);
    }

    #[test]
    fn test_lands_at_or_below_min_radius() {
        let mut b = brick(0, 130.0);
        b.start_falling(0.0);
        assert_eq!(b.advance(50.0, 123.0), FallStep::Landed);
        assert!(b.radius_position() <= 123.0);

        b.settle(123.0);
        assert_eq!(b.radius_position(), 123.0);
        assert!(b.is_attached());
        assert!(!b.is_active_falling());
    }

    #[test]
    fn test_zero_elapsed_at_slot_lands_immediately() {
        let mut b = brick(2, 123.0);
        b.start_falling(500.0);
        assert_eq!(b.advance(500.0, 123.0), FallStep::Landed);
        assert_eq!(b.radius_position(), 123.0);
    }

    #[test]
    fn test_interrupt_observed_at_next_tick() {
        let mut b = brick(0, 450.0);
        b.start_falling(0.0);
        b.interrupt_fall();
        // Still a falling brick until the next advance observes the flag
        assert!(b.is_falling());
        assert_eq!(b.advance(16.0, 123.0), FallStep::Landed);
    }

    #[test]
    fn test_resync_prevents_time_jump() {
        let mut b = brick(0, 450.0);
        b.start_falling(0.0);
        b.resync(10_000.0);
        b.advance(10_010.0, 123.0);
        assert!((b.radius_position() - 448.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotate_wraps_sectors() {
        let mut b = brick(0, 200.0);
        assert_eq!(b.rotate(RotateDirection::Left), -60.0);
        assert_eq!(b.sector(), 5);
        assert_eq!(b.angle_position(), 300.0);

        assert_eq!(b.rotate(RotateDirection::Right), 60.0);
        assert_eq!(b.angle_position(), 0.0);

        let mut b = brick(5, 200.0);
        b.rotate(RotateDirection::Right);
        assert_eq!(b.sector(), 0);
    }

    #[test]
    fn test_wedge_tracks_position() {
        let b = brick(1, 146.0);
        let w = b.wedge();
        assert_eq!(w.outer_radius, 146.0);
        assert_eq!(w.inner_radius, 126.0);
        assert_eq!(w.start_angle, 60.0);
        assert_eq!(w.span, 60.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_rejects_invalid_sector() {
        brick(6, 200.0);
    }
}
