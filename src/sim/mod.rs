//! Polar grid game state
//!
//! All gameplay logic lives here. The module is deterministic given a seed
//! and the caller's frame timestamps:
//! - Time only enters through `tick(now_ms)`
//! - Seeded RNG only
//! - Stable iteration order (spawn order, colour order)
//! - Drawing goes through the `Surface` trait

pub mod board;
pub mod brick;
pub mod score;
pub mod session;
pub mod wedge;

pub use board::{Board, BoardEvent, ClearedBrick, check_for_siblings, palette_size};
pub use brick::{Brick, BrickColor, BrickId, FallPhase, FallStep, RotateDirection, StackSlot};
pub use score::Score;
pub use session::{GameSession, ScriptedSpawn, SpawnMode, test_mode_requested};
pub use wedge::{Wedge, build_wedge_path, path_data, polygon_vertices};
