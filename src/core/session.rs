//! Session: the single mutation entry point for one learner
//!
//! Owns profile, course, ledger and the running lesson attempt. Every
//! mutation is either a synchronous `SessionCommand`, a request/response
//! pair around the content generator, or a delayed `Timer` that the caller
//! schedules and feeds back through `fire`.
//!
//! Counters:
//! - `course_epoch` bumps whenever the course or profile changes; request
//!   tickets from an older epoch are stale.
//! - `mood_epoch` bumps on every dashboard mood change; mood timers carry it.
//! - `badge_epoch` bumps on every badge notice; notice timers carry it.
//! - Shake timers carry the engine's own shake token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::ledger::{complete_lesson, LessonCompletion};
use crate::core::quiz::QuizEngine;
use crate::core::rewards::{award_badge, credit_lesson, feed, FeedOutcome};
use crate::core::shuffle::{RandomShuffler, Shuffler};
use crate::types::{
    Badge, Course, GenerationError, Lesson, LessonContent, MascotLevel, Mood, ProgressLedger,
    QuizOutcome, QuizOutput, QuizReason, SessionReason, Timer, TimerKind, UserProfile,
};
use crate::{
    BADGE_NOTICE_MS, COURSE_CELEBRATION_MS, EATING_MS, IDLE_BORED_MS, LESSON_CELEBRATION_MS,
    STARTING_FOOD,
};

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Synchronous actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    StartQuiz,
    SelectOption { option: String },
    Submit,
    SelectLeft { term: String },
    SelectRight { term: String },
    Advance,
    ExitLesson,
    Feed,
    DismissLevelUp,
    ClearCourse,
}

/// Proof that a generator request was admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestTicket {
    pub id: u64,
    pub epoch: u64,
}

/// Inputs for a course outline request
#[derive(Debug, Clone)]
pub struct CourseJob {
    pub ticket: RequestTicket,
    pub profile: UserProfile,
}

/// Inputs for a lesson content request
#[derive(Debug, Clone)]
pub struct LessonJob {
    pub ticket: RequestTicket,
    pub topic: String,
    pub lesson: Lesson,
    pub profile: Option<UserProfile>,
}

/// The running lesson attempt
#[derive(Debug, Clone)]
pub struct ActiveLesson {
    pub lesson_id: String,
    pub title: String,
    pub engine: QuizEngine,
}

/// Result of any session mutation
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutput {
    pub timestamp: DateTime<Utc>,
    pub reason: SessionReason,
    /// Mood currently shown (lesson mood while a lesson is open)
    pub mood: Mood,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<LessonCompletion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedOutcome>,
    /// Delayed commands the caller must schedule
    #[serde(skip)]
    pub timers: Vec<Timer>,
}

impl SessionOutput {
    pub fn is_ok(&self) -> bool {
        matches!(
            self.reason,
            SessionReason::S501_PROFILE_SET
                | SessionReason::S504_COURSE_READY
                | SessionReason::S512_LESSON_READY
                | SessionReason::S514_QUIZ_UPDATED
                | SessionReason::S515_LESSON_CREDITED
                | SessionReason::S516_LESSON_EXITED
                | SessionReason::S517_FEED_HANDLED
                | SessionReason::S518_NOTICE_DISMISSED
                | SessionReason::S519_COURSE_CLEARED
                | SessionReason::S520_TIMER_APPLIED
                | SessionReason::S522_IDLE_OBSERVED
        )
    }
}

pub struct Session {
    id: String,
    profile: Option<UserProfile>,
    course: Option<Course>,
    ledger: ProgressLedger,
    active: Option<ActiveLesson>,
    mood: Mood,
    mood_epoch: u64,
    new_badge: Option<Badge>,
    badge_epoch: u64,
    level_up: Option<MascotLevel>,
    course_epoch: u64,
    pending_course: Option<u64>,
    pending_lesson: Option<u64>,
    shuffler: Box<dyn Shuffler>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("course", &self.course.as_ref().map(|c| &c.topic))
            .field("mood", &self.mood)
            .field("active", &self.active.as_ref().map(|a| &a.lesson_id))
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Box::new(RandomShuffler::new()))
    }
}

impl Session {
    pub fn new(shuffler: Box<dyn Shuffler>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            profile: None,
            course: None,
            ledger: ProgressLedger::new(),
            active: None,
            mood: Mood::Happy,
            mood_epoch: 0,
            new_badge: None,
            badge_epoch: 0,
            level_up: None,
            course_epoch: 0,
            pending_course: None,
            pending_lesson: None,
            shuffler,
        }
    }

    // -------------------------------------------------------------------------
    // Profile and course
    // -------------------------------------------------------------------------

    pub fn set_profile(&mut self, profile: UserProfile) -> SessionOutput {
        info!(session = %self.id, goal = %profile.goal, "profile set");
        self.profile = Some(profile);
        // An outline requested for the old goal no longer applies
        self.course_epoch += 1;
        self.output(SessionReason::S501_PROFILE_SET)
    }

    pub fn begin_course_request(&mut self) -> Result<CourseJob, SessionReason> {
        let profile = match &self.profile {
            Some(p) if !p.goal.trim().is_empty() => p.clone(),
            _ => return Err(SessionReason::S502_NO_PROFILE),
        };
        if self.pending_course.is_some() {
            return Err(SessionReason::S503_REQUEST_PENDING);
        }
        let ticket = self.ticket();
        self.pending_course = Some(ticket.id);
        debug!(session = %self.id, ticket = ticket.id, "course request admitted");
        Ok(CourseJob { ticket, profile })
    }

    pub fn finish_course_request(
        &mut self,
        ticket: RequestTicket,
        result: Result<Option<Course>, GenerationError>,
    ) -> SessionOutput {
        if self.pending_course == Some(ticket.id) {
            self.pending_course = None;
        } else {
            return self.output(SessionReason::S507_STALE_RESPONSE);
        }
        if ticket.epoch != self.course_epoch {
            debug!(session = %self.id, ticket = ticket.id, "course response superseded");
            return self.output(SessionReason::S507_STALE_RESPONSE);
        }

        match result {
            Ok(Some(course)) => {
                info!(session = %self.id, topic = %course.topic, lessons = course.lesson_count(), "course ready");
                self.course = Some(course);
                self.course_epoch += 1;
                // Lesson state belongs to the course; level and badges stay
                self.ledger.completed_lesson_ids.clear();
                self.ledger.food = STARTING_FOOD;
                self.ledger.food_eaten_progress = 0;

                let token = self.set_mood(Mood::Excited);
                let mut out = self.output(SessionReason::S504_COURSE_READY);
                out.timers.push(Timer::new(TimerKind::SettleMood, token, COURSE_CELEBRATION_MS));
                out
            }
            Ok(None) => {
                warn!(session = %self.id, "generator returned no usable course");
                self.output(SessionReason::S505_COURSE_REJECTED)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "course generation failed");
                self.output(SessionReason::S506_GENERATION_FAILED)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lessons
    // -------------------------------------------------------------------------

    pub fn begin_lesson_request(&mut self, lesson_id: &str) -> Result<LessonJob, SessionReason> {
        let course = self.course.as_ref().ok_or(SessionReason::S508_NO_COURSE)?;
        if self.active.is_some() {
            return Err(SessionReason::S511_LESSON_ACTIVE);
        }
        if self.pending_lesson.is_some() {
            return Err(SessionReason::S503_REQUEST_PENDING);
        }
        let lesson = course
            .find_lesson(lesson_id)
            .ok_or(SessionReason::S509_UNKNOWN_LESSON)?;
        if lesson.is_locked {
            return Err(SessionReason::S510_LESSON_LOCKED);
        }

        let job = LessonJob {
            ticket: self.ticket(),
            topic: course.topic.clone(),
            lesson: lesson.clone(),
            profile: self.profile.clone(),
        };
        self.pending_lesson = Some(job.ticket.id);
        Ok(job)
    }

    pub fn finish_lesson_request(
        &mut self,
        ticket: RequestTicket,
        lesson_id: &str,
        result: Result<LessonContent, GenerationError>,
    ) -> SessionOutput {
        if self.pending_lesson == Some(ticket.id) {
            self.pending_lesson = None;
        } else {
            return self.output(SessionReason::S507_STALE_RESPONSE);
        }
        if ticket.epoch != self.course_epoch || self.active.is_some() {
            return self.output(SessionReason::S507_STALE_RESPONSE);
        }
        let Some(lesson) = self.course.as_ref().and_then(|c| c.find_lesson(lesson_id)) else {
            return self.output(SessionReason::S509_UNKNOWN_LESSON);
        };
        let title = lesson.title.clone();

        let engine = match result.and_then(|content| QuizEngine::new(content).map_err(GenerationError::from)) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(session = %self.id, lesson = lesson_id, error = %e, "lesson content unavailable");
                return self.output(SessionReason::S523_LESSON_UNAVAILABLE);
            }
        };

        info!(session = %self.id, lesson = lesson_id, questions = engine.question_count(), "lesson started");
        let quiz = engine.current_output();
        self.active = Some(ActiveLesson { lesson_id: lesson_id.to_string(), title, engine });
        self.set_mood(Mood::Happy);
        let mut out = self.output(SessionReason::S512_LESSON_READY);
        out.quiz = Some(quiz);
        out
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    pub fn apply(&mut self, command: SessionCommand) -> SessionOutput {
        debug!(session = %self.id, ?command, "apply");
        match command {
            SessionCommand::StartQuiz => self.quiz_step(|e, s| e.start_quiz(s)),
            SessionCommand::SelectOption { option } => self.quiz_step(|e, _| e.select_option(&option)),
            SessionCommand::Submit => self.quiz_step(|e, _| e.submit()),
            SessionCommand::SelectLeft { term } => self.quiz_step(|e, _| e.select_left(&term)),
            SessionCommand::SelectRight { term } => self.quiz_step(|e, _| e.select_right(&term)),
            SessionCommand::Advance => self.quiz_step(|e, s| e.advance(s)),
            SessionCommand::ExitLesson => self.exit_lesson(),
            SessionCommand::Feed => self.feed(),
            SessionCommand::DismissLevelUp => {
                self.level_up = None;
                self.output(SessionReason::S518_NOTICE_DISMISSED)
            }
            SessionCommand::ClearCourse => self.clear_course(),
        }
    }

    fn quiz_step<F>(&mut self, step: F) -> SessionOutput
    where
        F: FnOnce(&mut QuizEngine, &mut dyn Shuffler) -> QuizOutput,
    {
        let Some(active) = self.active.as_mut() else {
            return self.output(SessionReason::S513_NO_ACTIVE_LESSON);
        };
        let mut quiz = step(&mut active.engine, self.shuffler.as_mut());
        let timers: Vec<Timer> = quiz.timer.take().into_iter().collect();

        if quiz.reason == QuizReason::Q111_HEARTS_EXHAUSTED {
            info!(session = %self.id, lesson = %active.lesson_id, "lesson failed, hearts exhausted");
        }
        if quiz.reason == QuizReason::Q110_LESSON_COMPLETED && quiz.outcome == QuizOutcome::Completed {
            return self.credit_active(quiz);
        }

        let mut out = self.output(SessionReason::S514_QUIZ_UPDATED);
        out.timers = timers;
        out.quiz = Some(quiz);
        out
    }

    /// completeLesson, food, xp, badge, celebration; in that order
    fn credit_active(&mut self, quiz: QuizOutput) -> SessionOutput {
        let Some(active) = self.active.take() else {
            return self.output(SessionReason::S513_NO_ACTIVE_LESSON);
        };
        let Some(course) = self.course.as_mut() else {
            return self.output(SessionReason::S508_NO_COURSE);
        };
        let completion = match complete_lesson(course, &mut self.ledger, &active.lesson_id) {
            Ok(c) => c,
            Err(reason) => {
                warn!(session = %self.id, lesson = %active.lesson_id, %reason, "completion rejected");
                return self.output(SessionReason::S509_UNKNOWN_LESSON);
            }
        };
        credit_lesson(&mut self.ledger, quiz.reward_xp.unwrap_or(0));
        let badge = award_badge(
            &mut self.ledger,
            completion.completed_count,
            completion.unit_just_completed,
            Utc::now(),
        );
        info!(
            session = %self.id,
            lesson = %active.lesson_id,
            completed = completion.completed_count,
            unit_done = completion.unit_just_completed,
            food = self.ledger.food,
            "lesson completed"
        );

        let mut timers = Vec::new();
        let token = self.set_mood(Mood::Excited);
        timers.push(Timer::new(TimerKind::SettleMood, token, LESSON_CELEBRATION_MS));
        if let Some(badge) = &badge {
            info!(session = %self.id, badge = ?badge.id, "badge unlocked");
            self.badge_epoch += 1;
            self.new_badge = Some(badge.clone());
            timers.push(Timer::new(TimerKind::ClearBadgeNotice, self.badge_epoch, BADGE_NOTICE_MS));
        }

        let mut out = self.output(SessionReason::S515_LESSON_CREDITED);
        out.quiz = Some(quiz);
        out.completion = Some(completion);
        out.badge = badge;
        out.timers = timers;
        out
    }

    fn exit_lesson(&mut self) -> SessionOutput {
        match self.active.take() {
            Some(active) => {
                debug!(session = %self.id, lesson = %active.lesson_id, outcome = ?active.engine.outcome(), "lesson exited");
                self.output(SessionReason::S516_LESSON_EXITED)
            }
            None => self.output(SessionReason::S513_NO_ACTIVE_LESSON),
        }
    }

    fn feed(&mut self) -> SessionOutput {
        let outcome = feed(&mut self.ledger, self.mood == Mood::Eating);
        let mut timers = Vec::new();
        if outcome.reason.fed() {
            if outcome.leveled_up() {
                info!(session = %self.id, level = outcome.level.number(), "companion leveled up");
                self.level_up = Some(outcome.level);
            }
            let token = self.set_mood(Mood::Eating);
            timers.push(Timer::new(
                TimerKind::FinishEating { leveled_up: outcome.completed_cycle() },
                token,
                EATING_MS,
            ));
        }
        let mut out = self.output(SessionReason::S517_FEED_HANDLED);
        out.feed = Some(outcome);
        out.timers = timers;
        out
    }

    fn clear_course(&mut self) -> SessionOutput {
        if self.active.is_some() {
            return self.output(SessionReason::S511_LESSON_ACTIVE);
        }
        if self.course.take().is_none() {
            return self.output(SessionReason::S508_NO_COURSE);
        }
        self.course_epoch += 1;
        info!(session = %self.id, xp = self.ledger.xp, badges = self.ledger.badges.len(), "course cleared");
        self.output(SessionReason::S519_COURSE_CLEARED)
    }

    // -------------------------------------------------------------------------
    // Time
    // -------------------------------------------------------------------------

    /// Deliver a delayed command; stale tokens are discarded
    pub fn fire(&mut self, timer: Timer) -> SessionOutput {
        let applied = match timer.kind {
            TimerKind::ClearShake => match self.active.as_mut() {
                Some(active) => {
                    let quiz = active.engine.clear_shake(timer.token);
                    quiz.accepted()
                }
                None => false,
            },
            TimerKind::FinishEating { leveled_up } => {
                let live = timer.token == self.mood_epoch && self.mood == Mood::Eating;
                if live {
                    self.set_mood(if leveled_up { Mood::Excited } else { Mood::Happy });
                }
                live
            }
            TimerKind::SettleMood => {
                let live = timer.token == self.mood_epoch && self.mood == Mood::Excited;
                if live {
                    self.set_mood(Mood::Happy);
                }
                live
            }
            TimerKind::ClearBadgeNotice => {
                let live = timer.token == self.badge_epoch && self.new_badge.is_some();
                if live {
                    self.new_badge = None;
                }
                live
            }
        };

        if applied {
            self.output(SessionReason::S520_TIMER_APPLIED)
        } else {
            debug!(session = %self.id, ?timer, "stale timer discarded");
            self.output(SessionReason::S521_TIMER_STALE)
        }
    }

    /// Dashboard boredom: more than a minute idle turns the companion sad,
    /// any activity within the minute cheers it up again
    pub fn observe_idle(&mut self, idle: Duration) -> SessionOutput {
        if self.active.is_none() && self.mood != Mood::Eating {
            let bored = idle > Duration::from_millis(IDLE_BORED_MS);
            if bored && self.mood != Mood::Sad {
                self.set_mood(Mood::Sad);
            } else if !bored && self.mood == Mood::Sad {
                self.set_mood(Mood::Happy);
            }
        }
        self.output(SessionReason::S522_IDLE_OBSERVED)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ticket(&self) -> RequestTicket {
        RequestTicket {
            id: NEXT_TICKET.fetch_add(1, Ordering::Relaxed),
            epoch: self.course_epoch,
        }
    }

    /// Returns the new epoch for timers that should settle this mood
    fn set_mood(&mut self, mood: Mood) -> u64 {
        self.mood = mood;
        self.mood_epoch += 1;
        self.mood_epoch
    }

    fn output(&self, reason: SessionReason) -> SessionOutput {
        SessionOutput {
            timestamp: Utc::now(),
            reason,
            mood: self.mood(),
            quiz: None,
            completion: None,
            badge: None,
            feed: None,
            timers: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn active_lesson(&self) -> Option<&ActiveLesson> {
        self.active.as_ref()
    }

    /// Lesson mood while a lesson is open, dashboard mood otherwise
    pub fn mood(&self) -> Mood {
        match &self.active {
            Some(active) => active.engine.mood(),
            None => self.mood,
        }
    }

    pub fn dashboard_mood(&self) -> Mood {
        self.mood
    }

    pub fn new_badge(&self) -> Option<&Badge> {
        self.new_badge.as_ref()
    }

    pub fn level_up_notice(&self) -> Option<MascotLevel> {
        self.level_up
    }

    pub fn is_loading_course(&self) -> bool {
        self.pending_course.is_some()
    }

    pub fn is_loading_lesson(&self) -> bool {
        self.pending_lesson.is_some()
    }

    /// Rounded share of course lessons completed
    pub fn course_progress(&self) -> u32 {
        self.course
            .as_ref()
            .map(|c| c.progress_percent(&self.ledger))
            .unwrap_or(0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shuffle::IdentityShuffler;
    use crate::types::{FeedReason, Question, QuestionType, Unit};
    use crate::types::BadgeId;

    fn course() -> Course {
        Course {
            id: "c1".into(),
            topic: "Testing".into(),
            units: vec![Unit {
                id: "u1".into(),
                title: "Unit".into(),
                description: String::new(),
                color: "bg-brand".into(),
                lessons: vec![Lesson::new("l1", "One", false), Lesson::new("l2", "Two", true)],
            }],
        }
    }

    fn content() -> LessonContent {
        LessonContent {
            theory: "Theory".into(),
            questions: vec![Question::choice("q1", QuestionType::TrueFalse, "Yes?", &["True", "False"], "True")],
        }
    }

    fn session_with_course() -> Session {
        let mut s = Session::new(Box::new(IdentityShuffler));
        s.set_profile(UserProfile::new("testing", "dev"));
        let job = s.begin_course_request().unwrap();
        s.finish_course_request(job.ticket, Ok(Some(course())));
        s
    }

    fn open_lesson(s: &mut Session, id: &str) -> SessionOutput {
        let job = s.begin_lesson_request(id).unwrap();
        s.finish_lesson_request(job.ticket, id, Ok(content()))
    }

    fn play_through(s: &mut Session) -> SessionOutput {
        s.apply(SessionCommand::StartQuiz);
        s.apply(SessionCommand::SelectOption { option: "True".into() });
        s.apply(SessionCommand::Submit);
        s.apply(SessionCommand::Advance)
    }

    #[test]
    fn test_course_request_needs_goal() {
        let mut s = Session::new(Box::new(IdentityShuffler));
        assert_eq!(s.begin_course_request().unwrap_err(), SessionReason::S502_NO_PROFILE);
    }

    #[test]
    fn test_duplicate_course_request_refused() {
        let mut s = Session::new(Box::new(IdentityShuffler));
        s.set_profile(UserProfile::new("testing", ""));
        let _job = s.begin_course_request().unwrap();
        assert!(s.is_loading_course());
        assert_eq!(s.begin_course_request().unwrap_err(), SessionReason::S503_REQUEST_PENDING);
    }

    #[test]
    fn test_course_ready_resets_food_and_celebrates() {
        let s = session_with_course();
        assert_eq!(s.ledger().food, STARTING_FOOD);
        assert_eq!(s.mood(), Mood::Excited);
        assert!(!s.is_loading_course());
    }

    #[test]
    fn test_failed_generation_leaves_state() {
        let mut s = session_with_course();
        let job = s.begin_course_request().unwrap();
        let out = s.finish_course_request(job.ticket, Err(GenerationError::EmptyResponse));
        assert_eq!(out.reason, SessionReason::S506_GENERATION_FAILED);
        assert_eq!(s.course().unwrap().id, "c1");

        let job = s.begin_course_request().unwrap();
        let out = s.finish_course_request(job.ticket, Ok(None));
        assert_eq!(out.reason, SessionReason::S505_COURSE_REJECTED);
        assert!(s.course().is_some());
    }

    #[test]
    fn test_profile_change_makes_response_stale() {
        let mut s = Session::new(Box::new(IdentityShuffler));
        s.set_profile(UserProfile::new("one", ""));
        let job = s.begin_course_request().unwrap();
        s.set_profile(UserProfile::new("two", ""));
        let out = s.finish_course_request(job.ticket, Ok(Some(course())));
        assert_eq!(out.reason, SessionReason::S507_STALE_RESPONSE);
        assert!(s.course().is_none());
        assert!(!s.is_loading_course());
    }

    #[test]
    fn test_locked_lesson_cannot_start() {
        let mut s = session_with_course();
        assert_eq!(s.begin_lesson_request("l2").unwrap_err(), SessionReason::S510_LESSON_LOCKED);
        assert_eq!(s.begin_lesson_request("zz").unwrap_err(), SessionReason::S509_UNKNOWN_LESSON);
    }

    #[test]
    fn test_lesson_start_sets_happy() {
        let mut s = session_with_course();
        let out = open_lesson(&mut s, "l1");
        assert_eq!(out.reason, SessionReason::S512_LESSON_READY);
        assert_eq!(s.dashboard_mood(), Mood::Happy);
        assert_eq!(s.begin_lesson_request("l1").unwrap_err(), SessionReason::S511_LESSON_ACTIVE);
    }

    #[test]
    fn test_missing_content_reports_unavailable() {
        let mut s = session_with_course();
        let job = s.begin_lesson_request("l1").unwrap();
        let out = s.finish_lesson_request(job.ticket, "l1", Err(GenerationError::MissingApiKey));
        assert_eq!(out.reason, SessionReason::S523_LESSON_UNAVAILABLE);
        assert!(s.active_lesson().is_none());
        assert!(!s.is_loading_lesson());
    }

    #[test]
    fn test_completion_credits_in_order() {
        let mut s = session_with_course();
        open_lesson(&mut s, "l1");
        let out = play_through(&mut s);
        assert_eq!(out.reason, SessionReason::S515_LESSON_CREDITED);
        assert_eq!(out.badge.as_ref().map(|b| b.id), Some(BadgeId::FirstLesson));
        assert_eq!(s.ledger().food, STARTING_FOOD + 2);
        assert_eq!(s.ledger().xp, 0);
        assert!(s.active_lesson().is_none());
        assert_eq!(s.mood(), Mood::Excited);
        assert_eq!(s.new_badge().map(|b| b.id), Some(BadgeId::FirstLesson));

        let kinds: Vec<TimerKind> = out.timers.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TimerKind::SettleMood, TimerKind::ClearBadgeNotice]);
        assert!(!s.course().unwrap().units[0].lessons[1].is_locked);
    }

    #[test]
    fn test_newer_badge_notice_outlives_older_timer() {
        let mut s = session_with_course();
        open_lesson(&mut s, "l1");
        let first = play_through(&mut s);
        open_lesson(&mut s, "l2");
        let second = play_through(&mut s);
        assert_eq!(second.badge.as_ref().map(|b| b.id), Some(BadgeId::Master));

        let old_notice = first.timers[1];
        let new_notice = second.timers[1];
        assert_eq!(old_notice.kind, TimerKind::ClearBadgeNotice);
        assert_eq!(s.fire(old_notice).reason, SessionReason::S521_TIMER_STALE);
        assert_eq!(s.new_badge().map(|b| b.id), Some(BadgeId::Master));

        assert_eq!(s.fire(new_notice).reason, SessionReason::S520_TIMER_APPLIED);
        assert!(s.new_badge().is_none());
    }

    #[test]
    fn test_completion_makes_eating_timer_stale() {
        let mut s = session_with_course();
        open_lesson(&mut s, "l1");
        let fed = s.apply(SessionCommand::Feed);
        assert_eq!(s.dashboard_mood(), Mood::Eating);

        let out = play_through(&mut s);
        assert_eq!(out.reason, SessionReason::S515_LESSON_CREDITED);
        assert_eq!(s.mood(), Mood::Excited);

        assert_eq!(s.fire(fed.timers[0]).reason, SessionReason::S521_TIMER_STALE);
        assert_eq!(s.mood(), Mood::Excited);
    }

    #[test]
    fn test_failed_attempt_changes_nothing() {
        let mut s = session_with_course();
        let job = s.begin_lesson_request("l1").unwrap();
        let mut two = content();
        two.questions.push(Question::choice("q2", QuestionType::TrueFalse, "No?", &["True", "False"], "False"));
        s.finish_lesson_request(job.ticket, "l1", Ok(two));
        let food = s.ledger().food;

        s.apply(SessionCommand::StartQuiz);
        s.apply(SessionCommand::SelectOption { option: "False".into() });
        s.apply(SessionCommand::Submit);
        s.apply(SessionCommand::Advance);
        s.apply(SessionCommand::SelectOption { option: "True".into() });
        let out = s.apply(SessionCommand::Submit);
        assert_eq!(out.quiz.unwrap().outcome, QuizOutcome::Failed);
        assert_eq!(s.mood(), Mood::Sad);

        let out = s.apply(SessionCommand::Advance);
        assert_eq!(out.reason, SessionReason::S514_QUIZ_UPDATED);
        assert_eq!(out.quiz.unwrap().reason, QuizReason::Q209_ATTEMPT_OVER);
        assert_eq!(s.apply(SessionCommand::ExitLesson).reason, SessionReason::S516_LESSON_EXITED);
        assert_eq!(s.ledger().food, food);
        assert_eq!(s.ledger().completed_count(), 0);
        assert!(s.course().unwrap().units[0].lessons[1].is_locked);
    }

    #[test]
    fn test_settle_timer_is_epoch_guarded() {
        let mut s = session_with_course();
        open_lesson(&mut s, "l1");
        let out = play_through(&mut s);
        let settle = out.timers[0];

        // Feeding supersedes the celebration
        s.apply(SessionCommand::Feed);
        assert_eq!(s.fire(settle).reason, SessionReason::S521_TIMER_STALE);
        assert_eq!(s.mood(), Mood::Eating);
    }

    #[test]
    fn test_feed_eating_cycle() {
        let mut s = session_with_course();
        let out = s.apply(SessionCommand::Feed);
        assert_eq!(out.feed.unwrap().reason, FeedReason::F401_FED);
        assert_eq!(s.mood(), Mood::Eating);

        let again = s.apply(SessionCommand::Feed);
        assert_eq!(again.feed.unwrap().reason, FeedReason::F405_ALREADY_EATING);
        assert!(again.timers.is_empty());

        assert_eq!(s.fire(out.timers[0]).reason, SessionReason::S520_TIMER_APPLIED);
        assert_eq!(s.mood(), Mood::Happy);
        assert_eq!(s.ledger().food, STARTING_FOOD - 1);
    }

    #[test]
    fn test_level_up_sets_notice() {
        let mut s = session_with_course();
        s.ledger.food_eaten_progress = 4;
        let out = s.apply(SessionCommand::Feed);
        assert_eq!(s.level_up_notice(), Some(MascotLevel::Teen));
        s.fire(out.timers[0]);
        assert_eq!(s.mood(), Mood::Excited);
        s.apply(SessionCommand::DismissLevelUp);
        assert_eq!(s.level_up_notice(), None);
    }

    #[test]
    fn test_shake_timer_after_exit_is_stale() {
        let mut s = Session::new(Box::new(IdentityShuffler));
        s.set_profile(UserProfile::new("x", ""));
        let job = s.begin_course_request().unwrap();
        s.finish_course_request(job.ticket, Ok(Some(course())));
        let job = s.begin_lesson_request("l1").unwrap();
        let matching = LessonContent {
            theory: String::new(),
            questions: vec![Question::matching("m", "Match", &[("A", "1"), ("B", "2")])],
        };
        s.finish_lesson_request(job.ticket, "l1", Ok(matching));
        s.apply(SessionCommand::StartQuiz);
        s.apply(SessionCommand::SelectLeft { term: "A".into() });
        let out = s.apply(SessionCommand::SelectRight { term: "2".into() });
        let shake = out.timers[0];
        s.apply(SessionCommand::ExitLesson);
        assert_eq!(s.fire(shake).reason, SessionReason::S521_TIMER_STALE);
    }

    #[test]
    fn test_idle_boredom() {
        let mut s = Session::new(Box::new(IdentityShuffler));
        s.observe_idle(Duration::from_secs(61));
        assert_eq!(s.mood(), Mood::Sad);
        s.observe_idle(Duration::from_secs(5));
        assert_eq!(s.mood(), Mood::Happy);
    }

    #[test]
    fn test_clear_course_keeps_ledger() {
        let mut s = session_with_course();
        open_lesson(&mut s, "l1");
        assert_eq!(s.apply(SessionCommand::ClearCourse).reason, SessionReason::S511_LESSON_ACTIVE);
        play_through(&mut s);
        assert_eq!(s.apply(SessionCommand::ClearCourse).reason, SessionReason::S519_COURSE_CLEARED);
        assert!(s.course().is_none());
        assert_eq!(s.ledger().badges.len(), 1);
        assert_eq!(s.apply(SessionCommand::ClearCourse).reason, SessionReason::S508_NO_COURSE);
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: SessionCommand = serde_json::from_str(r#"{"type":"select_left","term":"Cat"}"#).unwrap();
        assert_eq!(cmd, SessionCommand::SelectLeft { term: "Cat".into() });
        let cmd: SessionCommand = serde_json::from_str(r#"{"type":"advance"}"#).unwrap();
        assert_eq!(cmd, SessionCommand::Advance);
    }
}
