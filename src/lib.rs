//! Lesson Engine: quiz state machine, progress ledger and reward economy
//!
//! A lesson is a theory passage followed by a quiz. Finishing the quiz feeds
//! the progress ledger (unlocks, unit completion) and the reward economy
//! (badges, food for the companion).

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// LIVES
// =============================================================================

/// Hearts at the start of every lesson attempt
pub const MAX_HEARTS: u8 = 2;

// =============================================================================
// FOOD ECONOMY
// =============================================================================

/// Food credited for every completed lesson, regardless of score
pub const FOOD_PER_LESSON: u32 = 2;

/// Food granted when a new course starts
pub const STARTING_FOOD: u32 = 3;

/// Feeds needed to grow one level
pub const FEEDS_PER_LEVEL: u8 = 5;

/// Experience reported by a completed lesson (always zero)
pub const LESSON_XP_STIPEND: u32 = 0;

/// Streak shown for a fresh session
pub const DEFAULT_STREAK: u32 = 2;

// =============================================================================
// TIMERS (milliseconds)
// =============================================================================

/// Mismatch shake marker lifetime
pub const SHAKE_CLEAR_MS: u64 = 500;

/// Eating animation before the mood settles
pub const EATING_MS: u64 = 2000;

/// "Badge unlocked" notice lifetime
pub const BADGE_NOTICE_MS: u64 = 4000;

/// Excited mood after completing a lesson
pub const LESSON_CELEBRATION_MS: u64 = 8000;

/// Excited mood after a new course is generated
pub const COURSE_CELEBRATION_MS: u64 = 5000;

/// Dashboard idle time before the companion gets bored
pub const IDLE_BORED_MS: u64 = 60_000;

// =============================================================================
// CONTENT FORMAT
// =============================================================================

/// Separator between the two sides of a matching pair
pub const PAIR_SEPARATOR: &str = "::";

/// Placeholder answer carried by matching questions
pub const MATCH_ALL: &str = "MATCH_ALL";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";
