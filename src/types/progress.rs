//! Session-scoped progress ledger, badges and companion level

use std::collections::BTreeSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{DEFAULT_STREAK, FEEDS_PER_LEVEL};

/// The fixed badge catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    /// Complete your first lesson
    FirstLesson,
    /// Complete 3 lessons
    Scholar,
    /// Finish an entire unit
    Master,
}

impl BadgeId {
    /// Catalog in evaluation priority order
    pub const ALL: [BadgeId; 3] = [BadgeId::FirstLesson, BadgeId::Scholar, BadgeId::Master];

    pub fn name(&self) -> &'static str {
        match self {
            BadgeId::FirstLesson => "Fast Starter",
            BadgeId::Scholar => "Scholar",
            BadgeId::Master => "Course Master",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            BadgeId::FirstLesson => "🚀",
            BadgeId::Scholar => "🎓",
            BadgeId::Master => "🏆",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeId::FirstLesson => "Complete your first lesson",
            BadgeId::Scholar => "Complete 3 lessons",
            BadgeId::Master => "Finish an entire unit",
        }
    }

    /// Stamp an unlocked badge
    pub fn unlock(self, at: DateTime<Utc>) -> Badge {
        Badge {
            id: self,
            name: self.name().to_string(),
            icon: self.icon().to_string(),
            description: self.description().to_string(),
            unlocked_at: at,
        }
    }
}

/// A one-time achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Companion growth stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MascotLevel {
    #[default]
    Baby,
    Teen,
    Adult,
}

impl MascotLevel {
    /// Next stage, capped at Adult
    pub fn next(self) -> Self {
        match self {
            MascotLevel::Baby => MascotLevel::Teen,
            MascotLevel::Teen | MascotLevel::Adult => MascotLevel::Adult,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            MascotLevel::Baby => 1,
            MascotLevel::Teen => 2,
            MascotLevel::Adult => 3,
        }
    }

    pub fn stage_name(&self) -> &'static str {
        match self {
            MascotLevel::Baby => "Baby",
            MascotLevel::Teen => "Teen",
            MascotLevel::Adult => "Adult",
        }
    }
}

/// Goal-independent counters that survive course replacement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLedger {
    pub xp: u32,
    pub streak: u32,
    pub food: u32,
    /// Feeds towards the next level, always below `FEEDS_PER_LEVEL`
    pub food_eaten_progress: u8,
    pub mascot_level: MascotLevel,
    pub completed_lesson_ids: BTreeSet<String>,
    /// Insertion order is unlock order
    pub badges: Vec<Badge>,
}

impl Default for ProgressLedger {
    fn default() -> Self {
        Self {
            xp: 0,
            streak: DEFAULT_STREAK,
            food: 0,
            food_eaten_progress: 0,
            mascot_level: MascotLevel::Baby,
            completed_lesson_ids: BTreeSet::new(),
            badges: Vec::new(),
        }
    }
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_lesson_ids.len()
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.completed_lesson_ids.contains(lesson_id)
    }

    pub fn owned_badges(&self) -> Vec<BadgeId> {
        self.badges.iter().map(|b| b.id).collect()
    }

    pub fn has_badge(&self, id: BadgeId) -> bool {
        self.badges.iter().any(|b| b.id == id)
    }

    /// Progress bar towards the next level, 0-100
    pub fn level_progress_percent(&self) -> u32 {
        self.food_eaten_progress as u32 * 100 / FEEDS_PER_LEVEL as u32
    }
}
