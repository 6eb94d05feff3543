//! Board and session configuration
//!
//! Plain serde structs so tuning can be loaded from JSON. Missing fields fall
//! back to the defaults in [`crate::consts`].

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Errors raised while loading or validating configuration
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Geometry and timing of the board and its bricks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Board center in surface coordinates
    pub center: Vec2,
    /// Number of base edges (sectors)
    pub edge_count: u32,
    /// Inner hexagon radius (collision floor)
    pub base_radius: f32,
    /// Outer boundary radius (spawn line and game over threshold)
    pub field_radius: f32,
    /// Duration of one rotation step animation
    pub rotation_duration_ms: f32,
    /// Radial thickness of a brick
    pub brick_height: f32,
    /// Empty radial space below each brick
    pub brick_gap: f32,
    /// Milliseconds per radial unit of fall
    pub fall_speed: f32,
    /// Delay between tagging a cleared brick and deleting its shape
    pub removal_delay_ms: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            edge_count: DEFAULT_EDGE_COUNT,
            base_radius: BASE_RADIUS,
            field_radius: BASE_RADIUS * FIELD_RADIUS_FACTOR,
            rotation_duration_ms: ROTATION_DURATION_MS,
            brick_height: BRICK_HEIGHT,
            brick_gap: BRICK_GAP,
            fall_speed: BRICK_FALL_SPEED,
            removal_delay_ms: REMOVAL_DELAY_MS,
        }
    }
}

impl BoardConfig {
    /// Default board centred in a viewport of the given size
    pub fn for_viewport(width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(width / 2.0, height / 2.0),
            ..Self::default()
        }
    }

    /// Angular size of one sector in degrees
    #[inline]
    pub fn rotation_step(&self) -> f32 {
        360.0 / self.edge_count as f32
    }

    /// Radial space one stacked brick occupies
    #[inline]
    pub fn slot_height(&self) -> f32 {
        self.brick_height + self.brick_gap
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.edge_count < 3 {
            return Err(ConfigError::Invalid(format!(
                "edge_count must be at least 3, got {}",
                self.edge_count
            )));
        }
        if self.base_radius <= 0.0 {
            return Err(ConfigError::Invalid("base_radius must be positive".into()));
        }
        if self.field_radius <= self.base_radius {
            return Err(ConfigError::Invalid(format!(
                "field_radius ({}) must exceed base_radius ({})",
                self.field_radius, self.base_radius
            )));
        }
        if self.brick_height <= 0.0 || self.brick_gap < 0.0 {
            return Err(ConfigError::Invalid(
                "brick_height must be positive and brick_gap non-negative".into(),
            ));
        }
        if self.fall_speed <= 0.0 {
            return Err(ConfigError::Invalid("fall_speed must be positive".into()));
        }
        if self.rotation_duration_ms < 0.0 || self.removal_delay_ms < 0.0 {
            return Err(ConfigError::Invalid("durations must be non-negative".into()));
        }
        Ok(())
    }
}

/// Driver settings layered on top of the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub board: BoardConfig,
    /// Time between spawned bricks
    pub spawn_interval_ms: f64,
    /// Spawn the deterministic test sequence instead of random bricks
    pub test_mode: bool,
    /// Fall speed override applied to test mode bricks
    pub test_fall_speed: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            test_mode: false,
            test_fall_speed: TEST_MODE_FALL_SPEED,
        }
    }
}

impl SessionConfig {
    pub fn for_viewport(width: f32, height: f32) -> Self {
        Self {
            board: BoardConfig::for_viewport(width, height),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        if self.spawn_interval_ms <= 0.0 {
            return Err(ConfigError::Invalid(
                "spawn_interval_ms must be positive".into(),
            ));
        }
        if self.test_fall_speed <= 0.0 {
            return Err(ConfigError::Invalid("test_fall_speed must be positive".into()));
        }
        Ok(())
    }
}
