//! Course tree: course → units → lessons → content

use serde::{Deserialize, Serialize};
use crate::types::{ContentError, ProgressLedger, Question};

/// Theory passage plus the questions that test it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
    pub theory: String,
    pub questions: Vec<Question>,
}

impl LessonContent {
    /// Every question must be well formed and there must be at least one
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.questions.is_empty() {
            return Err(ContentError::NoQuestions);
        }
        for question in &self.questions {
            question.validate()?;
        }
        Ok(())
    }

    /// Does the set contain a matching question?
    pub fn has_matching(&self) -> bool {
        self.questions.iter().any(|q| q.kind.is_matching())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_locked: bool,
    /// Pre-baked content; generated on demand when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<LessonContent>,
}

impl Lesson {
    pub fn new(id: &str, title: &str, is_locked: bool) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            is_completed: false,
            is_locked,
            content: None,
        }
    }

    /// Completed either by flag or by ledger membership
    pub fn is_done(&self, ledger: &ProgressLedger) -> bool {
        self.is_completed || ledger.has_completed(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Presentation colour token, e.g. `bg-brand`
    #[serde(default)]
    pub color: String,
    pub lessons: Vec<Lesson>,
}

impl Unit {
    /// Derived on every call, never stored
    pub fn is_complete(&self, ledger: &ProgressLedger) -> bool {
        self.lessons.iter().all(|l| l.is_done(ledger))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub topic: String,
    pub units: Vec<Unit>,
}

impl Course {
    /// Lessons in unit-major, then lesson order
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.units.iter().flat_map(|u| u.lessons.iter())
    }

    pub fn lessons_mut(&mut self) -> impl Iterator<Item = &mut Lesson> {
        self.units.iter_mut().flat_map(|u| u.lessons.iter_mut())
    }

    pub fn find_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons().find(|l| l.id == lesson_id)
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons().count()
    }

    /// Rounded percentage of lessons completed (0 for an empty course)
    pub fn progress_percent(&self, ledger: &ProgressLedger) -> u32 {
        let total = self.lesson_count();
        if total == 0 {
            return 0;
        }
        let done = self.lessons().filter(|l| l.is_done(ledger)).count();
        ((done as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Companion species chosen at onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetKind {
    #[default]
    Dog,
    Cat,
}

/// What the learner told us at onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub goal: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub pet_preference: PetKind,
}

impl UserProfile {
    pub fn new(goal: &str, background: &str) -> Self {
        Self {
            goal: goal.to_string(),
            background: background.to_string(),
            pet_preference: PetKind::Dog,
        }
    }
}
