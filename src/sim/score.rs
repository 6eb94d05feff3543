//! Score counter and difficulty progression

use serde::{Deserialize, Serialize};

use super::board::ClearedBrick;

/// Score needed (exclusive) for each difficulty level above 1
const LEVEL_THRESHOLDS: [(u64, u32); 3] = [(35, 4), (25, 3), (10, 2)];

/// Running score for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub current: u64,
    /// Number of clear batches reported
    pub batches: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cleared batch (one point per brick); returns the resulting difficulty level
    pub fn update_score(&mut self, removed: &[ClearedBrick]) -> u32 {
        self.current += removed.len() as u64;
        self.batches += 1;
        self.difficulty_level()
    }

    /// Level for the current score
    pub fn difficulty_level(&self) -> u32 {
        LEVEL_THRESHOLDS
            .iter()
            .find(|(threshold, _)| self.current > *threshold)
            .map(|&(_, level)| level)
            .unwrap_or(1)
    }
}
