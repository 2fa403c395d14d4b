//! Read-only projections of a session for presentation shells
//!
//! Everything here is derived on demand from session state; nothing is
//! cached, so a view can never disagree with the ledger it came from.

use serde::Serialize;

use crate::core::quiz::MatchBoard;
use crate::core::session::{ActiveLesson, Session};
use crate::types::{
    AttemptStatus, Badge, Course, MascotLevel, MatchPair, Mood, Phase, ProgressLedger,
    QuestionType, QuizOutcome, UserProfile,
};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub session_id: String,
    pub profile: Option<UserProfile>,
    pub course: Option<Course>,
    pub ledger: ProgressLedger,
    /// Rounded percentage of course lessons completed
    pub course_progress: u32,
    pub mood: Mood,
    pub bubble_text: String,
    pub mascot_stage: String,
    /// Feeds towards the next level, 0-100
    pub level_progress: u32,
    pub new_badge: Option<Badge>,
    pub level_up: Option<MascotLevel>,
    pub loading_course: bool,
    pub loading_lesson: bool,
    pub lesson: Option<LessonView>,
}

impl DashboardView {
    pub fn of(session: &Session) -> Self {
        let ledger = session.ledger().clone();
        let mood = session.mood();
        Self {
            session_id: session.id().to_string(),
            profile: session.profile().cloned(),
            course: session.course().cloned(),
            course_progress: session.course_progress(),
            mood,
            bubble_text: mood.bubble_text(ledger.food).to_string(),
            mascot_stage: ledger.mascot_level.stage_name().to_string(),
            level_progress: ledger.level_progress_percent(),
            new_badge: session.new_badge().cloned(),
            level_up: session.level_up_notice(),
            loading_course: session.is_loading_course(),
            loading_lesson: session.is_loading_lesson(),
            lesson: session.active_lesson().map(LessonView::of),
            ledger,
        }
    }
}

/// The running attempt, without answers that have not been earned yet
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub lesson_id: String,
    pub title: String,
    pub phase: Phase,
    pub outcome: QuizOutcome,
    pub theory: String,
    pub current_index: usize,
    pub question_count: usize,
    pub hearts: u8,
    pub progress: f64,
    pub status: AttemptStatus,
    pub mood: Mood,
    pub question: Option<QuestionView>,
    pub selected_option: Option<String>,
    /// Shown once a choice question is resolved
    pub revealed_answer: Option<String>,
    pub board: Option<BoardView>,
}

impl LessonView {
    pub fn of(active: &ActiveLesson) -> Self {
        let engine = &active.engine;
        let question = engine.current_question().map(|q| QuestionView {
            kind: q.kind,
            prompt: q.prompt.clone(),
            options: if q.kind.is_matching() { Vec::new() } else { q.options.clone() },
            explanation: engine
                .status()
                .is_resolved()
                .then(|| q.explanation.clone())
                .flatten(),
        });
        Self {
            lesson_id: active.lesson_id.clone(),
            title: active.title.clone(),
            phase: engine.phase(),
            outcome: engine.outcome(),
            theory: engine.theory().to_string(),
            current_index: engine.current_index(),
            question_count: engine.question_count(),
            hearts: engine.hearts(),
            progress: engine.progress(),
            status: engine.status(),
            mood: engine.mood(),
            question,
            selected_option: engine.selected_option().map(str::to_string),
            revealed_answer: engine.revealed_answer().map(str::to_string),
            board: engine.board().map(BoardView::of),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub prompt: String,
    /// Choices or word bank; empty for matching (see the board)
    pub options: Vec<String>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub left_terms: Vec<String>,
    pub right_terms: Vec<String>,
    pub matched: Vec<MatchPair>,
    pub selected_left: Option<String>,
    pub selected_right: Option<String>,
    pub shake: Option<String>,
}

impl BoardView {
    pub fn of(board: &MatchBoard) -> Self {
        Self {
            left_terms: board.left_terms().into_iter().map(str::to_string).collect(),
            right_terms: board.right_terms().into_iter().map(str::to_string).collect(),
            matched: board
                .pairs()
                .iter()
                .filter(|p| board.matched().contains(&p.id))
                .cloned()
                .collect(),
            selected_left: board.selected_left().map(str::to_string),
            selected_right: board.selected_right().map(str::to_string),
            shake: board.shake().map(str::to_string),
        }
    }
}
