//! Quiz Engine: per-lesson state machine
//!
//! Phase transitions:
//! - THEORY → QUIZ(0): explicit start, irreversible
//! - QUIZ(i) → QUIZ(i+1): advance once question i is resolved
//! - QUIZ(N-1) → COMPLETED: advance on the last question
//! - QUIZ(*) → FAILED: hearts reach zero (supersedes everything)
//!
//! Per question: IDLE → CORRECT | INCORRECT → advance.
//! Matching questions have no submit; each pairing is checked as soon as
//! both sides are selected and the question turns CORRECT when every pair
//! is matched. Mismatches cost a heart but never make the question INCORRECT.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;
use tracing::debug;

use crate::core::answer::{check_choice, find_pair};
use crate::core::hearts::HeartTracker;
use crate::core::shuffle::Shuffler;
use crate::types::{
    AttemptStatus, ContentError, LessonContent, MatchPair, Mood, Phase, Question,
    QuizOutcome, QuizOutput, QuizReason, Timer, TimerKind,
};
use crate::{LESSON_XP_STIPEND, SHAKE_CLEAR_MS};

/// Shake tokens are unique across attempts so a timer can never clear
/// the shake of a newer attempt
static NEXT_SHAKE_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Which column of a matching board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Live state of the current matching question
#[derive(Debug, Clone)]
pub struct MatchBoard {
    pairs: Vec<MatchPair>,
    left_order: Vec<usize>,
    right_order: Vec<usize>,
    matched: BTreeSet<String>,
    selected_left: Option<String>,
    selected_right: Option<String>,
    shake: Option<String>,
    shake_token: u64,
}

impl MatchBoard {
    /// Lay out a question; each side gets its own independent permutation
    pub fn new(question: &Question, shuffler: &mut dyn Shuffler) -> Self {
        let pairs = question.pairs();
        let left_order = shuffler.permutation(pairs.len());
        let right_order = shuffler.permutation(pairs.len());
        Self {
            pairs,
            left_order,
            right_order,
            matched: BTreeSet::new(),
            selected_left: None,
            selected_right: None,
            shake: None,
            shake_token: 0,
        }
    }

    /// Left terms in presentation order
    pub fn left_terms(&self) -> Vec<&str> {
        self.left_order.iter().map(|&i| self.pairs[i].left.as_str()).collect()
    }

    /// Right terms in presentation order
    pub fn right_terms(&self) -> Vec<&str> {
        self.right_order.iter().map(|&i| self.pairs[i].right.as_str()).collect()
    }

    pub fn pairs(&self) -> &[MatchPair] {
        &self.pairs
    }

    pub fn matched(&self) -> &BTreeSet<String> {
        &self.matched
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() == self.pairs.len()
    }

    pub fn selected_left(&self) -> Option<&str> {
        self.selected_left.as_deref()
    }

    pub fn selected_right(&self) -> Option<&str> {
        self.selected_right.as_deref()
    }

    /// `"<left>-<right>"` of the last mismatch until its timer clears it
    pub fn shake(&self) -> Option<&str> {
        self.shake.as_deref()
    }

    /// Is the term offered on that side at all?
    fn offers(&self, side: Side, term: &str) -> bool {
        self.pairs.iter().any(|p| side_of(p, side) == term)
    }

    /// Is there an unmatched pair carrying this term?
    pub fn is_open(&self, side: Side, term: &str) -> bool {
        self.pairs
            .iter()
            .any(|p| side_of(p, side) == term && !self.matched.contains(&p.id))
    }
}

fn side_of(pair: &MatchPair, side: Side) -> &str {
    match side {
        Side::Left => &pair.left,
        Side::Right => &pair.right,
    }
}

/// Lesson attempt state machine
#[derive(Debug, Clone)]
pub struct QuizEngine {
    content: LessonContent,
    phase: Phase,
    outcome: QuizOutcome,
    current_index: usize,
    hearts: HeartTracker,
    selected_option: Option<String>,
    status: AttemptStatus,
    board: Option<MatchBoard>,
    /// Progress bar, 0-100
    progress: f64,
    last_reason: QuizReason,
}

impl QuizEngine {
    /// Fresh attempt in the theory phase
    pub fn new(content: LessonContent) -> Result<Self, ContentError> {
        content.validate()?;
        Ok(Self {
            content,
            phase: Phase::Theory,
            outcome: QuizOutcome::InProgress,
            current_index: 0,
            hearts: HeartTracker::new(),
            selected_option: None,
            status: AttemptStatus::Idle,
            board: None,
            progress: 0.0,
            last_reason: QuizReason::Q202_NOT_IN_THEORY,
        })
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// THEORY → QUIZ(0)
    pub fn start_quiz(&mut self, shuffler: &mut dyn Shuffler) -> QuizOutput {
        if self.outcome.is_terminal() {
            return self.ignore(QuizReason::Q209_ATTEMPT_OVER);
        }
        if self.phase != Phase::Theory {
            return self.ignore(QuizReason::Q202_NOT_IN_THEORY);
        }
        self.phase = Phase::Quiz;
        self.current_index = 0;
        self.progress = 0.0;
        self.activate(shuffler);
        self.emit(QuizReason::Q101_QUIZ_STARTED)
    }

    /// Pick an option; can be changed until submit
    pub fn select_option(&mut self, option: &str) -> QuizOutput {
        if let Some(reason) = self.guard_choice() {
            return self.ignore(reason);
        }
        if !self.current().options.iter().any(|o| o == option) {
            return self.ignore(QuizReason::Q207_UNKNOWN_OPTION);
        }
        self.selected_option = Some(option.to_string());
        self.emit(QuizReason::Q102_OPTION_SELECTED)
    }

    /// Resolve a choice question against its selection
    pub fn submit(&mut self) -> QuizOutput {
        if let Some(reason) = self.guard_choice() {
            return self.ignore(reason);
        }
        let Some(selected) = self.selected_option.as_deref() else {
            return self.ignore(QuizReason::Q203_NO_SELECTION);
        };

        if check_choice(self.current(), selected).is_correct() {
            self.status = AttemptStatus::Correct;
            self.emit(QuizReason::Q103_ANSWER_CORRECT)
        } else {
            self.status = AttemptStatus::Incorrect;
            if self.lose_heart() {
                return self.emit(QuizReason::Q111_HEARTS_EXHAUSTED);
            }
            self.emit(QuizReason::Q104_ANSWER_INCORRECT)
        }
    }

    /// Select a term on one side of a matching question; evaluates once both sides are set
    pub fn select_term(&mut self, side: Side, term: &str) -> QuizOutput {
        if let Some(reason) = self.guard_quiz() {
            return self.ignore(reason);
        }
        if !self.current().kind.is_matching() {
            return self.ignore(QuizReason::Q206_WRONG_QUESTION_TYPE);
        }
        if self.status.is_resolved() {
            return self.ignore(QuizReason::Q204_ALREADY_RESOLVED);
        }
        let Some(board) = self.board.as_mut() else {
            return self.ignore(QuizReason::Q206_WRONG_QUESTION_TYPE);
        };
        if !board.offers(side, term) {
            return self.ignore(QuizReason::Q207_UNKNOWN_OPTION);
        }
        if !board.is_open(side, term) {
            return self.ignore(QuizReason::Q208_ALREADY_MATCHED);
        }

        match side {
            Side::Left => board.selected_left = Some(term.to_string()),
            Side::Right => board.selected_right = Some(term.to_string()),
        }
        match (board.selected_left.clone(), board.selected_right.clone()) {
            (Some(left), Some(right)) => self.check_pairing(&left, &right),
            _ => self.emit(QuizReason::Q105_SIDE_SELECTED),
        }
    }

    pub fn select_left(&mut self, term: &str) -> QuizOutput {
        self.select_term(Side::Left, term)
    }

    pub fn select_right(&mut self, term: &str) -> QuizOutput {
        self.select_term(Side::Right, term)
    }

    /// Next question, or COMPLETED after the last one
    pub fn advance(&mut self, shuffler: &mut dyn Shuffler) -> QuizOutput {
        if let Some(reason) = self.guard_quiz() {
            return self.ignore(reason);
        }
        if !self.status.is_resolved() {
            return self.ignore(QuizReason::Q205_NOT_RESOLVED);
        }

        let last = self.content.questions.len() - 1;
        if self.current_index < last {
            self.current_index += 1;
            self.activate(shuffler);
            self.progress = self.current_index as f64 / self.content.questions.len() as f64 * 100.0;
            self.emit(QuizReason::Q109_ADVANCED)
        } else {
            self.outcome = QuizOutcome::Completed;
            self.progress = 100.0;
            let mut output = self.emit(QuizReason::Q110_LESSON_COMPLETED);
            output.reward_xp = Some(LESSON_XP_STIPEND);
            output
        }
    }

    /// Timer callback for the mismatch shake marker
    pub fn clear_shake(&mut self, token: u64) -> QuizOutput {
        match self.board.as_mut() {
            Some(board) if board.shake.is_some() && board.shake_token == token => {
                board.shake = None;
                self.emit(QuizReason::Q112_SHAKE_CLEARED)
            }
            _ => self.ignore(QuizReason::Q210_STALE_TIMER),
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn current(&self) -> &Question {
        &self.content.questions[self.current_index]
    }

    fn guard_quiz(&self) -> Option<QuizReason> {
        if self.outcome.is_terminal() {
            Some(QuizReason::Q209_ATTEMPT_OVER)
        } else if self.phase != Phase::Quiz {
            Some(QuizReason::Q201_NOT_IN_QUIZ)
        } else {
            None
        }
    }

    fn guard_choice(&self) -> Option<QuizReason> {
        self.guard_quiz().or_else(|| {
            if self.current().kind.is_matching() {
                Some(QuizReason::Q206_WRONG_QUESTION_TYPE)
            } else if self.status.is_resolved() {
                Some(QuizReason::Q204_ALREADY_RESOLVED)
            } else {
                None
            }
        })
    }

    /// Reset per-question fields and lay out a matching board if needed
    fn activate(&mut self, shuffler: &mut dyn Shuffler) {
        self.selected_option = None;
        self.status = AttemptStatus::Idle;
        let question = &self.content.questions[self.current_index];
        self.board = question
            .kind
            .is_matching()
            .then(|| MatchBoard::new(question, shuffler));
    }

    fn check_pairing(&mut self, left: &str, right: &str) -> QuizOutput {
        let Some(board) = self.board.as_mut() else {
            return self.ignore(QuizReason::Q206_WRONG_QUESTION_TYPE);
        };
        board.selected_left = None;
        board.selected_right = None;

        let hit = find_pair(&board.pairs, left, right)
            .filter(|p| !board.matched.contains(&p.id))
            .map(|p| p.id.clone());

        if let Some(pair_id) = hit {
            board.matched.insert(pair_id);
            if board.is_complete() {
                self.status = AttemptStatus::Correct;
                return self.emit(QuizReason::Q108_MATCHING_COMPLETE);
            }
            return self.emit(QuizReason::Q106_PAIR_MATCHED);
        }

        let token = NEXT_SHAKE_TOKEN.fetch_add(1, Ordering::Relaxed);
        board.shake = Some(format!("{}-{}", left, right));
        board.shake_token = token;

        if self.lose_heart() {
            return self.emit(QuizReason::Q111_HEARTS_EXHAUSTED);
        }
        let mut output = self.emit(QuizReason::Q107_PAIR_MISMATCHED);
        output.timer = Some(Timer::new(TimerKind::ClearShake, token, SHAKE_CLEAR_MS));
        output
    }

    /// Returns true when this loss ended the attempt
    fn lose_heart(&mut self) -> bool {
        let left = self.hearts.lose();
        debug!(hearts = left, index = self.current_index, "heart lost");
        if left == 0 {
            self.outcome = QuizOutcome::Failed;
            true
        } else {
            false
        }
    }

    fn emit(&mut self, reason: QuizReason) -> QuizOutput {
        self.last_reason = reason;
        self.output(reason)
    }

    fn ignore(&self, reason: QuizReason) -> QuizOutput {
        self.output(reason)
    }

    fn output(&self, reason: QuizReason) -> QuizOutput {
        QuizOutput {
            timestamp: Utc::now(),
            phase: self.phase,
            outcome: self.outcome,
            current_index: self.current_index,
            question_count: self.content.questions.len(),
            hearts: self.hearts.remaining(),
            status: self.status,
            progress: self.progress,
            mood: self.mood(),
            reason,
            reward_xp: None,
            timer: None,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> QuizOutcome {
        self.outcome
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn question_count(&self) -> usize {
        self.content.questions.len()
    }

    pub fn hearts(&self) -> u8 {
        self.hearts.remaining()
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn theory(&self) -> &str {
        &self.content.theory
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    /// The question on screen (none before the quiz starts)
    pub fn current_question(&self) -> Option<&Question> {
        (self.phase == Phase::Quiz).then(|| self.current())
    }

    pub fn board(&self) -> Option<&MatchBoard> {
        self.board.as_ref()
    }

    /// Correct answer, shown once a choice question is resolved
    pub fn revealed_answer(&self) -> Option<&str> {
        let question = self.current_question()?;
        (self.status.is_resolved() && !question.kind.is_matching())
            .then_some(question.correct_answer.as_str())
    }

    /// Mood shown next to the quiz
    pub fn mood(&self) -> Mood {
        if self.outcome == QuizOutcome::Failed {
            return Mood::Sad;
        }
        if self.phase == Phase::Theory {
            return Mood::Happy;
        }
        match self.status {
            AttemptStatus::Correct => Mood::Excited,
            AttemptStatus::Incorrect if self.hearts.remaining() <= 1 => Mood::Sad,
            AttemptStatus::Incorrect => Mood::Worried,
            AttemptStatus::Idle if self.hearts.is_full() => Mood::Happy,
            AttemptStatus::Idle => Mood::Worried,
        }
    }

    /// Get current output without acting
    pub fn current_output(&self) -> QuizOutput {
        self.output(self.last_reason)
    }
}

// =============================================================================
// TESTS
// =============================================================================
