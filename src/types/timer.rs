//! Delayed commands tied to the generation counter of their owner

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// What a delayed command does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Clear the mismatch shake marker of the active lesson attempt
    ClearShake,
    /// Finish eating; mood becomes excited after a level-up, happy otherwise
    FinishEating { leveled_up: bool },
    /// Excited mood settles back to happy
    SettleMood,
    /// Drop the "badge unlocked" notice
    ClearBadgeNotice,
}

/// A delayed command. `token` must still match the owner's counter when it
/// fires, otherwise the command is stale and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub kind: TimerKind,
    pub token: u64,
    pub delay_ms: u64,
}

impl Timer {
    pub fn new(kind: TimerKind, token: u64, delay_ms: u64) -> Self {
        Self { kind, token, delay_ms }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
