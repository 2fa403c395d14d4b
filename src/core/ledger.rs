//! Progress Ledger: lesson completion, unlock propagation, unit completion
//!
//! Unlocking follows the flattened (unit-major, then lesson) order and
//! crosses unit boundaries. Unit completion is detected by comparing the
//! derived "all lessons done" before and after the mutation.

use serde::Serialize;
use crate::types::{Course, LedgerReason, ProgressLedger};

/// What a completion changed, fed to the reward economy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonCompletion {
    pub lesson_id: String,
    /// Size of the completed set after the update
    pub completed_count: usize,
    /// Some unit went from incomplete to complete in this call
    pub unit_just_completed: bool,
    /// Lesson unlocked by this completion, if any
    pub unlocked_lesson_id: Option<String>,
    /// The lesson had been completed before
    pub was_repeat: bool,
    pub reason: LedgerReason,
}

/// Record a completed lesson against the active course
///
/// Returns `Err(L304_UNKNOWN_LESSON)` without touching anything when the
/// lesson is not part of the course.
pub fn complete_lesson(
    course: &mut Course,
    ledger: &mut ProgressLedger,
    lesson_id: &str,
) -> Result<LessonCompletion, LedgerReason> {
    let position = course
        .lessons()
        .position(|l| l.id == lesson_id)
        .ok_or(LedgerReason::L304_UNKNOWN_LESSON)?;

    // "Before" uses the pre-mutation ledger and flags
    let complete_before: Vec<bool> = course.units.iter().map(|u| u.is_complete(ledger)).collect();
    let was_repeat = ledger.has_completed(lesson_id);

    ledger.completed_lesson_ids.insert(lesson_id.to_string());

    let mut unlocked_lesson_id = None;
    for (i, lesson) in course.lessons_mut().enumerate() {
        if i == position {
            lesson.is_completed = true;
        } else if i == position + 1 {
            if lesson.is_locked {
                unlocked_lesson_id = Some(lesson.id.clone());
            }
            lesson.is_locked = false;
        }
    }
    let has_next = position + 1 < course.lesson_count();

    let unit_just_completed = course
        .units
        .iter()
        .zip(complete_before)
        .any(|(unit, before)| !before && unit.is_complete(ledger));

    let reason = if !has_next {
        LedgerReason::L303_COURSE_END
    } else if unlocked_lesson_id.is_some() {
        LedgerReason::L302_NEXT_UNLOCKED
    } else {
        LedgerReason::L301_LESSON_RECORDED
    };

    Ok(LessonCompletion {
        lesson_id: lesson_id.to_string(),
        completed_count: ledger.completed_count(),
        unit_just_completed,
        unlocked_lesson_id,
        was_repeat,
        reason,
    })
}

// =============================================================================
// TESTS
// =============================================================================
