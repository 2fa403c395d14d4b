//! Quiz run state definitions and per-action output

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{QuizReason, Timer};

/// Lesson attempt phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Reading the theory passage
    Theory,
    /// Answering questions
    Quiz,
}

/// Per-question attempt status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Idle,
    Correct,
    Incorrect,
}

impl AttemptStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AttemptStatus::Idle)
    }
}

/// Whole-attempt outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizOutcome {
    InProgress,
    /// Every question advanced past; lesson is credited
    Completed,
    /// Hearts exhausted; only exit remains
    Failed,
}

impl QuizOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuizOutcome::InProgress)
    }
}

/// Companion mood, shared by the lesson runner and the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Happy,
    Sad,
    Excited,
    Worried,
    Eating,
}

impl Mood {
    /// Speech bubble for the companion
    pub fn bubble_text(&self, food: u32) -> &'static str {
        match self {
            Mood::Eating => "Yum! Tastes great! 🍖",
            _ if *self == Mood::Sad || food == 0 => "I'm hungry... earn me some bones? 🥺",
            Mood::Excited => "Amazing work! Let's keep going! 🎉",
            Mood::Worried => "Don't give up! You can do this. ❤️",
            _ => "Start learning, earn me bones. 🦴",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
            Mood::Worried => "worried",
            Mood::Eating => "eating",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot returned by every quiz action
#[derive(Debug, Clone, Serialize)]
pub struct QuizOutput {
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub outcome: QuizOutcome,
    pub current_index: usize,
    pub question_count: usize,
    pub hearts: u8,
    pub status: AttemptStatus,
    /// Progress bar, 0-100
    pub progress: f64,
    pub mood: Mood,
    pub reason: QuizReason,
    /// Experience reported on completion
    pub reward_xp: Option<u32>,
    /// Delayed follow-up the caller must schedule
    #[serde(skip)]
    pub timer: Option<Timer>,
}

impl QuizOutput {
    /// Did the action change anything?
    pub fn accepted(&self) -> bool {
        !self.reason.is_ignored()
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        use colored::Colorize;
        let hearts = "♥".repeat(self.hearts as usize);
        let status = match self.status {
            AttemptStatus::Idle => "idle".normal(),
            AttemptStatus::Correct => "correct".green(),
            AttemptStatus::Incorrect => "incorrect".red(),
        };
        format!(
            "{} q={}/{} | {} | progress={:.0}% | {}",
            hearts.red(),
            (self.current_index + 1).min(self.question_count),
            self.question_count,
            status,
            self.progress,
            self.reason.code().dimmed()
        )
    }
}
