//! Lives tracker: starts full, only ever goes down, floored at zero

use crate::MAX_HEARTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartTracker {
    remaining: u8,
}

impl Default for HeartTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartTracker {
    pub fn new() -> Self {
        Self { remaining: MAX_HEARTS }
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn is_full(&self) -> bool {
        self.remaining == MAX_HEARTS
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Take one heart; returns the hearts left
    pub fn lose(&mut self) -> u8 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}
