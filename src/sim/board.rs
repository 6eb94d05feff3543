//! The rotating base and its attached bricks
//!
//! The board owns every brick. Falling bricks advance once per [`Board::tick`]
//! in spawn order; a brick that lands is attached immediately, then match
//! detection and the game over check run before any other brick moves.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::brick::{Brick, BrickColor, BrickId, FallStep, RotateDirection, StackSlot};
use super::wedge::polygon_vertices;
use crate::config::BoardConfig;
use crate::consts::RADIUS_EPSILON;
use crate::normalize_angle;
use crate::surface::{ShapeHandle, Surface};

/// Notifications for the driver and scoring layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardEvent {
    BrickLanded {
        id: BrickId,
        sector: usize,
        radius: f32,
    },
    /// One match pass removed these bricks
    BricksCleared { bricks: Vec<ClearedBrick> },
    GameOver,
}

/// Snapshot of a brick removed by a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearedBrick {
    pub id: BrickId,
    pub color: BrickColor,
    pub angle_position: f32,
    pub radius_position: f32,
}

/// What a finished rotation animation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RotationTarget {
    Base,
    Brick(BrickId),
}

/// Deferred presentation work, fired by `tick` once due
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingEffect {
    RotationDone { target: RotationTarget, due_ms: f64 },
    RemoveShape { handle: ShapeHandle, due_ms: f64 },
}

impl PendingEffect {
    fn due_ms(&self) -> f64 {
        match *self {
            PendingEffect::RotationDone { due_ms, .. } => due_ms,
            PendingEffect::RemoveShape { due_ms, .. } => due_ms,
        }
    }
}

/// Palette size for a difficulty level
pub fn palette_size(level: u32) -> usize {
    match level {
        0 | 1 => 2,
        2 => 3,
        3 => 4,
        _ => 5,
    }
}

/// Indices in `group` that are siblings of `group[base_idx]`, the base itself included.
///
/// A sibling shares the ring (same radius, neighbouring sector, wrapping through 0)
/// or the stack (same sector, within one slot radially). Fewer than three
/// results count as no match and yield an empty list.
pub fn check_for_siblings<T: StackSlot>(group: &[&T], base_idx: usize, edge_count: usize) -> Vec<usize> {
    let base = group[base_idx];
    let reach = base.slot_height() + RADIUS_EPSILON;

    let results: Vec<usize> = group
        .iter()
        .enumerate()
        .filter(|(_, other)| {
            let same_ring = (other.radius_position() - base.radius_position()).abs() < RADIUS_EPSILON
                && sector_distance(other.sector(), base.sector(), edge_count) <= 1;
            let same_stack = other.sector() == base.sector()
                && (other.radius_position() - base.radius_position()).abs() <= reach;
            same_ring || same_stack
        })
        .map(|(i, _)| i)
        .collect();

    if results.len() < 3 { Vec::new() } else { results }
}

/// Circular distance between two sectors
#[inline]
fn sector_distance(a: usize, b: usize, edge_count: usize) -> usize {
    let d = a.abs_diff(b) % edge_count;
    d.min(edge_count - d)
}

fn redraw<S: Surface>(surface: &mut S, center: Vec2, brick: &Brick) {
    if let Some(handle) = brick.shape {
        surface.update_wedge(handle, &brick.wedge(), center);
    }
}

/// The hexagonal base, its field and every brick in play
pub struct Board<S: Surface> {
    config: BoardConfig,
    surface: S,
    base_shape: ShapeHandle,
    field_shape: ShapeHandle,
    /// Accumulated visual rotation of the base (degrees)
    rotation_deg: f32,
    difficulty_level: u32,
    colors: Vec<BrickColor>,
    attached: Vec<Brick>,
    /// Falling bricks in spawn order
    falling: Vec<Brick>,
    game_over: bool,
    /// Time of the latest tick
    clock_ms: f64,
    pending: Vec<PendingEffect>,
    events: Vec<BoardEvent>,
    rng: Pcg32,
    next_id: u32,
}

impl<S: Surface> Board<S> {
    /// Create a board and draw its field and base
    pub fn new(config: BoardConfig, mut surface: S, seed: u64) -> Self {
        assert!(config.edge_count >= 3, "a board needs at least 3 edges");

        let field_shape = surface.draw_polygon(
            &polygon_vertices(config.center, config.field_radius, config.edge_count, 0.0, false),
            "field",
        );
        let base_shape = surface.draw_polygon(
            &polygon_vertices(config.center, config.base_radius, config.edge_count, 0.0, false),
            "base",
        );

        let mut board = Self {
            config,
            surface,
            base_shape,
            field_shape,
            rotation_deg: 0.0,
            difficulty_level: 1,
            colors: Vec::new(),
            attached: Vec::new(),
            falling: Vec::new(),
            game_over: false,
            clock_ms: 0.0,
            pending: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        };
        board.update_colors(1);
        board
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn base_shape(&self) -> ShapeHandle {
        self.base_shape
    }

    pub fn field_shape(&self) -> ShapeHandle {
        self.field_shape
    }

    /// Current palette, read by the driver to pick spawn colours
    pub fn colors(&self) -> &[BrickColor] {
        &self.colors
    }

    pub fn difficulty_level(&self) -> u32 {
        self.difficulty_level
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn attached_bricks(&self) -> &[Brick] {
        &self.attached
    }

    pub fn falling_bricks(&self) -> &[Brick] {
        &self.falling
    }

    pub fn brick(&self, id: BrickId) -> Option<&Brick> {
        self.attached
            .iter()
            .chain(self.falling.iter())
            .find(|b| b.id == id)
    }

    /// Number of presentation effects still waiting to fire
    pub fn pending_effects(&self) -> usize {
        self.pending.len()
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sector index for an angle on a sector boundary.
    ///
    /// Panics if the angle is not finite or does not align to a sector.
    pub fn sector_for_angle(&self, angle: f32) -> usize {
        assert!(angle.is_finite(), "angle {angle} is not finite");
        let step = self.config.rotation_step();
        let slots = normalize_angle(angle) / step;
        assert!(
            (slots - slots.round()).abs() < 1e-3,
            "angle {angle} is not aligned to a {step} degree sector"
        );
        slots.round() as usize % self.config.edge_count as usize
    }

    /// Resize the palette for a difficulty level
    pub fn update_colors(&mut self, level: u32) {
        let size = palette_size(level);
        self.difficulty_level = level.max(1);
        self.colors = BrickColor::ALL[..size].to_vec();
        log::info!(
            "Difficulty level {}: {} colours",
            self.difficulty_level,
            self.colors.len()
        );
    }

    /// Spawn a brick at the field boundary and start its fall.
    ///
    /// Without an angle a random sector is chosen. Panics if `angle` is not a
    /// sector multiple or `fall_speed` is not positive.
    pub fn spawn_brick(
        &mut self,
        color: BrickColor,
        angle: Option<f32>,
        fall_speed: Option<f32>,
    ) -> BrickId {
        if let Some(speed) = fall_speed {
            assert!(speed > 0.0, "fall speed {speed} must be positive");
        }
        let sector = match angle {
            Some(angle) => self.sector_for_angle(angle),
            None => self.rng.random_range(0..self.config.edge_count as usize),
        };
        let id = BrickId(self.next_id);
        self.next_id += 1;

        let mut brick = Brick::new(id, color, sector, self.config.field_radius, &self.config);
        if let Some(speed) = fall_speed {
            brick.fall_speed = speed;
        }
        brick.shape = Some(
            self.surface
                .draw_wedge(&brick.wedge(), self.config.center, color.as_str()),
        );
        log::debug!("Spawned {:?} brick {:?} in sector {}", color, id, sector);

        brick.start_falling(self.clock_ms);
        self.step_brick(brick, self.clock_ms);
        id
    }

    /// Advance the board to `now_ms`: fire due effects, then move every falling brick once
    pub fn tick(&mut self, now_ms: f64) {
        self.clock_ms = now_ms;
        self.run_due_effects(now_ms);

        let falling = std::mem::take(&mut self.falling);
        for brick in falling {
            self.step_brick(brick, now_ms);
        }
    }

    /// Re-base every falling brick's frame time (after a pause)
    pub fn resync_clock(&mut self, now_ms: f64) {
        self.clock_ms = now_ms;
        for brick in &mut self.falling {
            brick.resync(now_ms);
        }
    }

    /// Ask a falling brick to stop; it lands on its next tick
    pub fn interrupt_fall(&mut self, id: BrickId) -> bool {
        match self.falling.iter_mut().find(|b| b.id == id) {
            Some(brick) => {
                brick.interrupt_fall();
                true
            }
            None => false,
        }
    }

    fn step_brick(&mut self, mut brick: Brick, now_ms: f64) {
        let min_radius = self.min_radius_fall(&brick);
        match brick.advance(now_ms, min_radius) {
            FallStep::Falling => {
                redraw(&mut self.surface, self.config.center, &brick);
                self.falling.push(brick);
            }
            FallStep::Landed => self.stop_falling(brick),
        }
    }

    /// Clamp to the exact stop radius, then attach
    fn stop_falling(&mut self, mut brick: Brick) {
        let min_radius = self.min_radius_fall(&brick);
        brick.settle(min_radius);
        redraw(&mut self.surface, self.config.center, &brick);
        self.attach_brick(brick);
    }

    /// Next free slot in the brick's sector: its own slot plus every attached brick below
    pub fn min_radius_fall(&self, brick: &Brick) -> f32 {
        self.config.base_radius
            + brick.slot_height()
            + self
                .attached_in_sector(brick.sector())
                .map(|b| b.slot_height())
                .sum::<f32>()
    }

    /// Attached bricks whose angle equals `angle`
    pub fn get_attached_bricks_by_angle_pos(&self, angle: f32) -> Vec<&Brick> {
        let sector = self.sector_for_angle(angle);
        self.attached_in_sector(sector).collect()
    }

    fn attached_in_sector(&self, sector: usize) -> impl Iterator<Item = &Brick> {
        self.attached.iter().filter(move |b| b.sector() == sector)
    }

    pub fn attach_brick(&mut self, brick: Brick) {
        self.events.push(BoardEvent::BrickLanded {
            id: brick.id,
            sector: brick.sector(),
            radius: brick.radius_position(),
        });
        log::debug!(
            "Brick {:?} attached in sector {} at radius {}",
            brick.id,
            brick.sector(),
            brick.radius_position()
        );
        self.attached.push(brick);
        self.process_combinations();
        self.check_if_game_over();
    }

    /// Remove an attached brick. Missing bricks were already removed and are not an error.
    pub fn remove_attached_brick_by_id(&mut self, id: BrickId) -> Option<Brick> {
        let idx = self.attached.iter().position(|b| b.id == id)?;
        Some(self.attached.remove(idx))
    }

    /// Find and clear colour matches. Returns the number of bricks removed.
    fn process_combinations(&mut self) -> usize {
        if self.attached.is_empty() {
            return 0;
        }
        let edge_count = self.config.edge_count as usize;

        let mut by_color: BTreeMap<BrickColor, Vec<&Brick>> = BTreeMap::new();
        for brick in &self.attached {
            by_color.entry(brick.color).or_default().push(brick);
        }

        let mut doomed: Vec<BrickId> = Vec::new();
        for group in by_color.values() {
            if group.len() < 3 {
                continue;
            }
            let siblings: BTreeSet<usize> = (0..group.len())
                .flat_map(|i| check_for_siblings(group, i, edge_count))
                .collect();
            if siblings.len() > 2 {
                doomed.extend(siblings.into_iter().map(|i| group[i].id));
            }
        }

        if doomed.is_empty() {
            return 0;
        }

        let due_ms = self.clock_ms + self.config.removal_delay_ms as f64;
        let mut cleared = Vec::with_capacity(doomed.len());
        for id in doomed {
            let Some(brick) = self.remove_attached_brick_by_id(id) else {
                log::debug!("Brick {:?} already removed", id);
                continue;
            };
            if let Some(handle) = brick.shape {
                self.surface.tag_shape_for_removal(handle);
                self.pending.push(PendingEffect::RemoveShape { handle, due_ms });
            }
            cleared.push(ClearedBrick {
                id: brick.id,
                color: brick.color,
                angle_position: brick.angle_position(),
                radius_position: brick.radius_position(),
            });
        }

        let removed = cleared.len();
        log::debug!("Cleared {} bricks", removed);
        self.events.push(BoardEvent::BricksCleared { bricks: cleared });
        self.close_brick_gap();
        removed
    }

    /// Drop every attached brick back into free fall so stacks re-settle
    fn close_brick_gap(&mut self) {
        let bricks = std::mem::take(&mut self.attached);
        log::debug!("Closing gaps: {} bricks re-falling", bricks.len());
        for mut brick in bricks {
            brick.start_falling(self.clock_ms);
            self.step_brick(brick, self.clock_ms);
        }
    }

    /// Flag game over once any stack of two or more reaches the field boundary
    fn check_if_game_over(&mut self) {
        if self.game_over {
            return;
        }
        let mut stacks: BTreeMap<usize, (usize, f32)> = BTreeMap::new();
        for brick in &self.attached {
            let entry = stacks.entry(brick.sector()).or_default();
            entry.0 += 1;
            entry.1 += brick.slot_height();
        }

        let overflow = stacks.iter().find(|(_, (count, height))| {
            *count >= 2 && self.config.base_radius + height >= self.config.field_radius
        });
        if let Some((sector, (count, _))) = overflow {
            self.game_over = true;
            self.events.push(BoardEvent::GameOver);
            log::info!("Game over: sector {} stacked {} bricks", sector, count);
        }
    }

    pub fn fire_left(&mut self) {
        self.rotate(RotateDirection::Left);
    }

    pub fn fire_right(&mut self) {
        self.rotate(RotateDirection::Right);
    }

    /// Rotate the base and every brick by one sector
    pub fn rotate(&mut self, direction: RotateDirection) {
        self.rotate_base(direction);
        self.rotate_bricks(direction);
    }

    fn rotate_base(&mut self, direction: RotateDirection) {
        let delta = direction.signum() * self.config.rotation_step();
        self.rotation_deg = normalize_angle(self.rotation_deg + delta);
        self.surface.animate_rotation(
            self.base_shape,
            delta,
            self.config.center,
            self.config.rotation_duration_ms,
        );
        self.pending.push(PendingEffect::RotationDone {
            target: RotationTarget::Base,
            due_ms: self.clock_ms + self.config.rotation_duration_ms as f64,
        });
    }

    /// Sectors change now; the animations only catch the visuals up
    fn rotate_bricks(&mut self, direction: RotateDirection) {
        let due_ms = self.clock_ms + self.config.rotation_duration_ms as f64;
        for brick in self.attached.iter_mut().chain(self.falling.iter_mut()) {
            let delta = brick.rotate(direction);
            if let Some(handle) = brick.shape {
                self.surface.animate_rotation(
                    handle,
                    delta,
                    self.config.center,
                    self.config.rotation_duration_ms,
                );
                self.pending.push(PendingEffect::RotationDone {
                    target: RotationTarget::Brick(brick.id),
                    due_ms,
                });
            }
        }
    }

    fn run_due_effects(&mut self, now_ms: f64) {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|e| e.due_ms() <= now_ms);
        self.pending = waiting;

        for effect in due {
            match effect {
                PendingEffect::RotationDone {
                    target: RotationTarget::Base,
                    ..
                } => self.surface.reset_transform(self.base_shape),
                PendingEffect::RotationDone {
                    target: RotationTarget::Brick(id),
                    ..
                } => {
                    let brick = self
                        .attached
                        .iter()
                        .chain(self.falling.iter())
                        .find(|b| b.id == id);
                    if let Some(brick) = brick {
                        if let Some(handle) = brick.shape {
                            self.surface.reset_transform(handle);
                        }
                        redraw(&mut self.surface, self.config.center, brick);
                    }
                }
                PendingEffect::RemoveShape { handle, .. } => self.surface.remove_shape(handle),
            }
        }
    }

    /// Cancel pending effects and remove every shape
    pub fn teardown(&mut self) {
        self.pending.clear();
        for brick in self.attached.drain(..).chain(self.falling.drain(..)) {
            if let Some(handle) = brick.shape {
                self.surface.remove_shape(handle);
            }
        }
        self.surface.remove_shape(self.base_shape);
        self.surface.remove_shape(self.field_shape);
        log::info!("Board torn down");
    }
}
