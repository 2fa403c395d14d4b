//! Core types for the lesson engine

mod question;
mod course;
mod progress;
mod quiz;
mod reason;
mod timer;
mod error;

pub use question::{Question, QuestionType, MatchPair, Verdict};
pub use course::{Course, Unit, Lesson, LessonContent, UserProfile, PetKind};
pub use progress::{ProgressLedger, Badge, BadgeId, MascotLevel};
pub use quiz::{Phase, AttemptStatus, QuizOutcome, Mood, QuizOutput};
pub use reason::{QuizReason, LedgerReason, FeedReason, SessionReason};
pub use timer::{Timer, TimerKind};
pub use error::{ContentError, GenerationError};
