//! Reward economy: badge evaluation and companion feeding
//!
//! Badges are checked in fixed priority order and at most one is awarded per
//! completion. Feeding spends one food; every fifth feed grows the companion
//! a level (capped at Adult) and resets the progress bar.

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::types::{Badge, BadgeId, FeedReason, MascotLevel, ProgressLedger};
use crate::{FEEDS_PER_LEVEL, FOOD_PER_LESSON};

/// Pick the badge earned by a completion, if any
pub fn evaluate_badge(completed_count: usize, unit_just_completed: bool, owned: &[BadgeId]) -> Option<BadgeId> {
    let owns = |id: BadgeId| owned.contains(&id);
    if completed_count >= 1 && !owns(BadgeId::FirstLesson) {
        Some(BadgeId::FirstLesson)
    } else if completed_count >= 3 && !owns(BadgeId::Scholar) {
        Some(BadgeId::Scholar)
    } else if unit_just_completed && !owns(BadgeId::Master) {
        Some(BadgeId::Master)
    } else {
        None
    }
}

/// Evaluate and append the earned badge to the ledger
pub fn award_badge(
    ledger: &mut ProgressLedger,
    completed_count: usize,
    unit_just_completed: bool,
    at: DateTime<Utc>,
) -> Option<Badge> {
    let id = evaluate_badge(completed_count, unit_just_completed, &ledger.owned_badges())?;
    let badge = id.unlock(at);
    ledger.badges.push(badge.clone());
    Some(badge)
}

/// Every completed lesson is worth the same food, whatever the score
pub fn credit_lesson(ledger: &mut ProgressLedger, earned_xp: u32) {
    ledger.food += FOOD_PER_LESSON;
    ledger.xp += earned_xp;
}

/// Result of one feed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedOutcome {
    pub reason: FeedReason,
    /// Level after the feed
    pub level: MascotLevel,
    pub food: u32,
    pub food_eaten_progress: u8,
}

impl FeedOutcome {
    /// A new stage was reached; show the celebration
    pub fn leveled_up(&self) -> bool {
        self.reason == FeedReason::F402_LEVELED_UP
    }

    /// The progress bar filled (with or without growth)
    pub fn completed_cycle(&self) -> bool {
        matches!(self.reason, FeedReason::F402_LEVELED_UP | FeedReason::F403_LEVEL_CAPPED)
    }
}

/// Feed the companion once. No-op without food or while already eating.
pub fn feed(ledger: &mut ProgressLedger, eating: bool) -> FeedOutcome {
    let reason = if ledger.food == 0 {
        FeedReason::F404_NO_FOOD
    } else if eating {
        FeedReason::F405_ALREADY_EATING
    } else {
        let next_progress = ledger.food_eaten_progress + 1;
        ledger.food -= 1;
        if next_progress >= FEEDS_PER_LEVEL {
            let next_level = ledger.mascot_level.next();
            let grew = next_level > ledger.mascot_level;
            ledger.food_eaten_progress = 0;
            ledger.mascot_level = next_level;
            if grew { FeedReason::F402_LEVELED_UP } else { FeedReason::F403_LEVEL_CAPPED }
        } else {
            ledger.food_eaten_progress = next_progress;
            FeedReason::F401_FED
        }
    };

    FeedOutcome {
        reason,
        level: ledger.mascot_level,
        food: ledger.food,
        food_eaten_progress: ledger.food_eaten_progress,
    }
}

// =============================================================================
// TESTS
// =============================================================================
