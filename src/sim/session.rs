//! Game session driver
//!
//! Owns the board, the score and the spawn schedule. The host calls
//! [`GameSession::tick`] once per animation frame with the current time.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::board::{Board, BoardEvent};
use super::brick::BrickColor;
use super::score::Score;
use crate::config::SessionConfig;
use crate::surface::Surface;

/// One brick of a scripted spawn sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedSpawn {
    pub color: BrickColor,
    /// Sector angle in degrees
    pub angle: f32,
}

/// How the session picks the next brick
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnMode {
    /// Random palette colour in a random sector
    Random,
    /// Fixed sequence; spawning stops when it runs out
    Scripted(VecDeque<ScriptedSpawn>),
}

impl SpawnMode {
    /// Deterministic sequence: a ring match followed by a stack match
    pub fn test_sequence(rotation_step: f32) -> Self {
        let mut script = VecDeque::new();
        for i in 0..3 {
            script.push_back(ScriptedSpawn {
                color: BrickColor::Blue,
                angle: rotation_step * i as f32,
            });
        }
        for _ in 0..3 {
            script.push_back(ScriptedSpawn {
                color: BrickColor::YellowGreen,
                angle: rotation_step * 3.0,
            });
        }
        SpawnMode::Scripted(script)
    }
}

/// Whether a URL query string (`?test`, `test=1`, `test=true`) asks for test mode
pub fn test_mode_requested(query: &str) -> bool {
    query
        .trim_start_matches('?')
        .split('&')
        .any(|pair| match pair.split_once('=') {
            Some((key, value)) => key == "test" && matches!(value, "1" | "true"),
            None => pair == "test",
        })
}

/// A running game: board, score and spawn timer
pub struct GameSession<S: Surface> {
    board: Board<S>,
    score: Score,
    config: SessionConfig,
    rng: Pcg32,
    spawn_mode: SpawnMode,
    next_spawn_ms: Option<f64>,
    paused_at: Option<f64>,
    running: bool,
    spawned: u32,
}

impl<S: Surface> GameSession<S> {
    /// Create a session; test mode in `config` selects the scripted sequence
    pub fn new(config: SessionConfig, surface: S, seed: u64) -> Self {
        let spawn_mode = if config.test_mode {
            SpawnMode::test_sequence(config.board.rotation_step())
        } else {
            SpawnMode::Random
        };
        Self::with_spawn_mode(config, surface, seed, spawn_mode)
    }

    pub fn with_spawn_mode(
        config: SessionConfig,
        surface: S,
        seed: u64,
        spawn_mode: SpawnMode,
    ) -> Self {
        Self {
            board: Board::new(config.board.clone(), surface, seed),
            score: Score::new(),
            config,
            rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
            spawn_mode,
            next_spawn_ms: None,
            paused_at: None,
            running: false,
            spawned: 0,
        }
    }

    pub fn board(&self) -> &Board<S> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<S> {
        &mut self.board
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Bricks spawned so far
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Spawn the first brick and schedule the rest
    pub fn start(&mut self, now_ms: f64) {
        self.running = true;
        self.board.resync_clock(now_ms);
        self.next_spawn_ms = Some(now_ms);
        log::info!(
            "Session started ({})",
            if matches!(self.spawn_mode, SpawnMode::Scripted(_)) {
                "scripted"
            } else {
                "random"
            }
        );
        self.spawn_due(now_ms);
    }

    /// Advance one frame. Returns the board events raised during it.
    pub fn tick(&mut self, now_ms: f64) -> Vec<BoardEvent> {
        if !self.running || self.is_paused() {
            return Vec::new();
        }
        self.board.tick(now_ms);
        self.spawn_due(now_ms);
        self.process_events()
    }

    fn spawn_due(&mut self, now_ms: f64) {
        let Some(due) = self.next_spawn_ms else {
            return;
        };
        if now_ms < due {
            return;
        }
        if self.board.game_over() {
            self.next_spawn_ms = None;
            return;
        }

        match &mut self.spawn_mode {
            SpawnMode::Random => {
                let colors = self.board.colors();
                let color = colors[self.rng.random_range(0..colors.len())];
                self.board.spawn_brick(color, None, None);
            }
            SpawnMode::Scripted(script) => {
                let Some(next) = script.pop_front() else {
                    self.next_spawn_ms = None;
                    return;
                };
                self.board.spawn_brick(
                    next.color,
                    Some(next.angle),
                    Some(self.config.test_fall_speed),
                );
                if script.is_empty() {
                    log::info!("Scripted sequence finished");
                    self.spawned += 1;
                    self.next_spawn_ms = None;
                    return;
                }
            }
        }
        self.spawned += 1;
        self.next_spawn_ms = Some(now_ms + self.config.spawn_interval_ms);
    }

    /// Feed clears to the score and react to level changes and game over
    fn process_events(&mut self) -> Vec<BoardEvent> {
        let events = self.board.drain_events();
        for event in &events {
            match event {
                BoardEvent::BricksCleared { bricks } => {
                    let level = self.score.update_score(bricks);
                    log::debug!("Score {} (+{})", self.score.current, bricks.len());
                    if level != self.board.difficulty_level() {
                        self.board.update_colors(level);
                    }
                }
                BoardEvent::GameOver => {
                    self.next_spawn_ms = None;
                    log::info!("Game over with score {}", self.score.current);
                }
                BoardEvent::BrickLanded { .. } => {}
            }
        }
        events
    }

    /// Pausing freezes spawning and falling; resuming continues without a time jump
    pub fn set_paused(&mut self, paused: bool, now_ms: f64) {
        match (paused, self.paused_at) {
            (true, None) => {
                self.paused_at = Some(now_ms);
                log::info!("Paused");
            }
            (false, Some(paused_at)) => {
                self.paused_at = None;
                if let Some(due) = &mut self.next_spawn_ms {
                    *due += now_ms - paused_at;
                }
                self.board.resync_clock(now_ms);
                log::info!("Resumed");
            }
            _ => {}
        }
    }

    pub fn fire_left(&mut self) {
        if self.accepts_input() {
            self.board.fire_left();
        }
    }

    pub fn fire_right(&mut self) {
        if self.accepts_input() {
            self.board.fire_right();
        }
    }

    fn accepts_input(&self) -> bool {
        self.running && !self.is_paused()
    }

    /// Stop spawning and drop every pending animation and shape
    pub fn teardown(&mut self) {
        self.running = false;
        self.next_spawn_ms = None;
        self.paused_at = None;
        self.board.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::sim::brick::StackSlot;
    use crate::surface::HeadlessSurface;

    const FRAME_MS: f64 = 16.0;

    fn run_until(session: &mut GameSession<HeadlessSurface>, from: f64, until: f64) -> f64 {
        let mut now = from;
        while now < until {
            now += FRAME_MS;
            session.tick(now);
        }
        now
    }

    fn scripted(spawns: &[(BrickColor, f32)]) -> SpawnMode {
        SpawnMode::Scripted(
            spawns
                .iter()
                .map(|&(color, angle)| ScriptedSpawn { color, angle })
                .collect(),
        )
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            test_fall_speed: 1.0,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_mode_query_parsing() {
        assert!(test_mode_requested("?test"));
        assert!(test_mode_requested("test=1"));
        assert!(test_mode_requested("?lang=en&test=true"));
        assert!(!test_mode_requested("?test=0"));
        assert!(!test_mode_requested("?testing=1"));
        assert!(!test_mode_requested(""));
    }

    #[test]
    fn test_test_sequence_clears_everything() {
        let config = SessionConfig {
            test_mode: true,
            ..SessionConfig::default()
        };
        let mut session = GameSession::new(config, HeadlessSurface::new(), 1);
        session.start(0.0);
        run_until(&mut session, 0.0, 10_000.0);

        assert_eq!(session.spawned(), 6);
        assert_eq!(session.score().current, 6);
        assert_eq!(session.score().batches, 2);
        assert!(session.board().attached_bricks().is_empty());
        assert!(session.board().falling_bricks().is_empty());
        assert!(!session.board().game_over());
        // Only the base and field remain once removal delays have passed
        assert_eq!(session.board().surface().shape_count(), 2);
    }

    #[test]
    fn test_first_spawn_is_immediate() {
        let mut session = GameSession::new(SessionConfig::default(), HeadlessSurface::new(), 3);
        session.start(1000.0);
        assert_eq!(session.spawned(), 1);
        // Last tick at 2488, just before the next spawn is due
        let now = run_until(&mut session, 1000.0, 2480.0);
        assert_eq!(session.spawned(), 1);
        run_until(&mut session, now, 2500.0);
        assert_eq!(session.spawned(), 2);
    }

    #[test]
    fn test_random_sessions_are_deterministic() {
        let snapshot = |seed: u64| {
            let mut session =
                GameSession::new(SessionConfig::default(), HeadlessSurface::new(), seed);
            session.start(0.0);
            run_until(&mut session, 0.0, 20_000.0);
            session
                .board()
                .attached_bricks()
                .iter()
                .chain(session.board().falling_bricks())
                .map(|b| (b.id, b.color, b.sector(), b.radius_position()))
                .collect::<Vec<_>>()
        };
        let a = snapshot(99);
        assert!(!a.is_empty());
        assert_eq!(a, snapshot(99));
    }

    #[test]
    fn test_game_over_stops_spawning() {
        let config = SessionConfig {
            board: BoardConfig {
                field_radius: 150.0,
                ..BoardConfig::default()
            },
            ..fast_config()
        };
        let mode = scripted(&[
            (BrickColor::Blue, 0.0),
            (BrickColor::YellowGreen, 0.0),
            (BrickColor::Blue, 0.0),
            (BrickColor::YellowGreen, 0.0),
            (BrickColor::Blue, 0.0),
        ]);
        let mut session = GameSession::with_spawn_mode(config, HeadlessSurface::new(), 1, mode);
        session.start(0.0);
        run_until(&mut session, 0.0, 10_000.0);

        assert!(session.board().game_over());
        assert_eq!(session.spawned(), 3);
        assert_eq!(session.board().attached_bricks().len(), 3);
    }

    #[test]
    fn test_score_milestone_grows_palette() {
        let mut spawns = Vec::new();
        for _ in 0..4 {
            for angle in [0.0, 60.0, 120.0] {
                spawns.push((BrickColor::Blue, angle));
            }
        }
        let mut session = GameSession::with_spawn_mode(
            fast_config(),
            HeadlessSurface::new(),
            5,
            scripted(&spawns),
        );
        session.start(0.0);
        run_until(&mut session, 0.0, 20_000.0);

        assert_eq!(session.score().current, 12);
        assert_eq!(session.board().difficulty_level(), 2);
        assert_eq!(session.board().colors().len(), 3);
    }

    #[test]
    fn test_pause_freezes_spawning_and_falling() {
        let mut session = GameSession::new(SessionConfig::default(), HeadlessSurface::new(), 8);
        session.start(0.0);
        session.tick(100.0);
        let radius = session.board().falling_bricks()[0].radius_position();

        session.set_paused(true, 100.0);
        session.fire_left();
        assert_eq!(session.board().rotation_deg(), 0.0);
        run_until(&mut session, 100.0, 5000.0);
        assert_eq!(session.spawned(), 1);
        assert_eq!(session.board().falling_bricks()[0].radius_position(), radius);

        session.set_paused(false, 5000.0);
        session.tick(5010.0);
        let moved = radius - session.board().falling_bricks()[0].radius_position();
        assert!((moved - 2.0).abs() < 1e-3);
        // Spawn schedule shifted by the pause
        assert_eq!(session.spawned(), 1);
        session.tick(6400.0);
        assert_eq!(session.spawned(), 2);
    }

    #[test]
    fn test_fire_rotates_board() {
        let mut session = GameSession::new(SessionConfig::default(), HeadlessSurface::new(), 2);
        session.fire_right();
        assert_eq!(session.board().rotation_deg(), 0.0);

        session.start(0.0);
        session.fire_right();
        assert_eq!(session.board().rotation_deg(), 60.0);
        session.fire_left();
        session.fire_left();
        assert_eq!(session.board().rotation_deg(), 300.0);
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut session = GameSession::new(SessionConfig::default(), HeadlessSurface::new(), 4);
        session.start(0.0);
        session.fire_left();
        session.teardown();

        assert!(!session.is_running());
        assert_eq!(session.board().surface().shape_count(), 0);
        assert!(session.tick(5000.0).is_empty());
        assert_eq!(session.spawned(), 1);
    }
}
