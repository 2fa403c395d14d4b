//! Reason codes for every engine, ledger, feeding and session decision
//!
//! Q1xx: quiz transitions, Q2xx: ignored quiz actions,
//! L3xx: ledger, F4xx: feeding, S5xx: session.

use serde::{Deserialize, Serialize};

/// Quiz state machine reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum QuizReason {
    // =========================================================================
    // Q1xx: Transitions
    // =========================================================================
    /// Theory read, quiz begins at question 0
    Q101_QUIZ_STARTED,
    /// Selection recorded (mutable until submit)
    Q102_OPTION_SELECTED,
    /// Submitted answer is correct
    Q103_ANSWER_CORRECT,
    /// Submitted answer is wrong, one heart lost
    Q104_ANSWER_INCORRECT,
    /// One side of a pairing selected, waiting for the other
    Q105_SIDE_SELECTED,
    /// Pairing correct, absorbed into matched pairs
    Q106_PAIR_MATCHED,
    /// Pairing wrong, one heart lost
    Q107_PAIR_MISMATCHED,
    /// All pairs matched, question correct
    Q108_MATCHING_COMPLETE,
    /// Moved to the next question
    Q109_ADVANCED,
    /// Last question advanced past, lesson completed
    Q110_LESSON_COMPLETED,
    /// Hearts reached zero, attempt failed
    Q111_HEARTS_EXHAUSTED,
    /// Shake marker cleared by its timer
    Q112_SHAKE_CLEARED,

    // =========================================================================
    // Q2xx: Ignored actions (no state change)
    // =========================================================================
    /// Action needs the quiz phase
    Q201_NOT_IN_QUIZ,
    /// Action needs the theory phase
    Q202_NOT_IN_THEORY,
    /// Submit without a selection
    Q203_NO_SELECTION,
    /// Question already resolved
    Q204_ALREADY_RESOLVED,
    /// Advance before the question is resolved
    Q205_NOT_RESOLVED,
    /// Action does not apply to this question type
    Q206_WRONG_QUESTION_TYPE,
    /// Option or term not offered by the question
    Q207_UNKNOWN_OPTION,
    /// Term already matched
    Q208_ALREADY_MATCHED,
    /// Attempt is completed or failed
    Q209_ATTEMPT_OVER,
    /// Timer belongs to an older shake
    Q210_STALE_TIMER,
}

impl QuizReason {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Q101_QUIZ_STARTED => "Q101_QUIZ_STARTED",
            Self::Q102_OPTION_SELECTED => "Q102_OPTION_SELECTED",
            Self::Q103_ANSWER_CORRECT => "Q103_ANSWER_CORRECT",
            Self::Q104_ANSWER_INCORRECT => "Q104_ANSWER_INCORRECT",
            Self::Q105_SIDE_SELECTED => "Q105_SIDE_SELECTED",
            Self::Q106_PAIR_MATCHED => "Q106_PAIR_MATCHED",
            Self::Q107_PAIR_MISMATCHED => "Q107_PAIR_MISMATCHED",
            Self::Q108_MATCHING_COMPLETE => "Q108_MATCHING_COMPLETE",
            Self::Q109_ADVANCED => "Q109_ADVANCED",
            Self::Q110_LESSON_COMPLETED => "Q110_LESSON_COMPLETED",
            Self::Q111_HEARTS_EXHAUSTED => "Q111_HEARTS_EXHAUSTED",
            Self::Q112_SHAKE_CLEARED => "Q112_SHAKE_CLEARED",
            Self::Q201_NOT_IN_QUIZ => "Q201_NOT_IN_QUIZ",
            Self::Q202_NOT_IN_THEORY => "Q202_NOT_IN_THEORY",
            Self::Q203_NO_SELECTION => "Q203_NO_SELECTION",
            Self::Q204_ALREADY_RESOLVED => "Q204_ALREADY_RESOLVED",
            Self::Q205_NOT_RESOLVED => "Q205_NOT_RESOLVED",
            Self::Q206_WRONG_QUESTION_TYPE => "Q206_WRONG_QUESTION_TYPE",
            Self::Q207_UNKNOWN_OPTION => "Q207_UNKNOWN_OPTION",
            Self::Q208_ALREADY_MATCHED => "Q208_ALREADY_MATCHED",
            Self::Q209_ATTEMPT_OVER => "Q209_ATTEMPT_OVER",
            Self::Q210_STALE_TIMER => "Q210_STALE_TIMER",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Q101_QUIZ_STARTED => "Assessment started",
            Self::Q102_OPTION_SELECTED => "Option selected",
            Self::Q103_ANSWER_CORRECT => "Correct",
            Self::Q104_ANSWER_INCORRECT => "Incorrect - one heart lost",
            Self::Q105_SIDE_SELECTED => "Pick the other side",
            Self::Q106_PAIR_MATCHED => "Pair matched",
            Self::Q107_PAIR_MISMATCHED => "Not a pair - one heart lost",
            Self::Q108_MATCHING_COMPLETE => "All pairs matched",
            Self::Q109_ADVANCED => "Next question",
            Self::Q110_LESSON_COMPLETED => "Lesson complete",
            Self::Q111_HEARTS_EXHAUSTED => "Out of lives - assessment failed",
            Self::Q112_SHAKE_CLEARED => "Shake cleared",
            Self::Q201_NOT_IN_QUIZ => "Not in the quiz phase",
            Self::Q202_NOT_IN_THEORY => "Not in the theory phase",
            Self::Q203_NO_SELECTION => "Nothing selected",
            Self::Q204_ALREADY_RESOLVED => "Question already answered",
            Self::Q205_NOT_RESOLVED => "Question not answered yet",
            Self::Q206_WRONG_QUESTION_TYPE => "Not available for this question type",
            Self::Q207_UNKNOWN_OPTION => "Unknown option",
            Self::Q208_ALREADY_MATCHED => "Term already matched",
            Self::Q209_ATTEMPT_OVER => "Attempt is over",
            Self::Q210_STALE_TIMER => "Stale timer ignored",
        }
    }

    /// Q2xx codes leave the state untouched
    pub fn is_ignored(&self) -> bool {
        self.code().starts_with("Q2")
    }
}

impl std::fmt::Display for QuizReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Progress ledger reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum LedgerReason {
    /// Lesson recorded, nothing else changed
    L301_LESSON_RECORDED,
    /// Lesson recorded and the next lesson unlocked
    L302_NEXT_UNLOCKED,
    /// Lesson recorded and this was the last lesson of the course
    L303_COURSE_END,
    /// Lesson id not in the active course
    L304_UNKNOWN_LESSON,
}

impl LedgerReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::L301_LESSON_RECORDED => "L301_LESSON_RECORDED",
            Self::L302_NEXT_UNLOCKED => "L302_NEXT_UNLOCKED",
            Self::L303_COURSE_END => "L303_COURSE_END",
            Self::L304_UNKNOWN_LESSON => "L304_UNKNOWN_LESSON",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::L301_LESSON_RECORDED => "Lesson recorded",
            Self::L302_NEXT_UNLOCKED => "Next lesson unlocked",
            Self::L303_COURSE_END => "Last lesson of the course",
            Self::L304_UNKNOWN_LESSON => "Lesson not in course",
        }
    }
}

impl std::fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Companion feeding reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum FeedReason {
    /// One food eaten, progress advanced
    F401_FED,
    /// Fifth feed, companion grew a level
    F402_LEVELED_UP,
    /// Fifth feed at the top level, progress reset without growth
    F403_LEVEL_CAPPED,
    /// No food left
    F404_NO_FOOD,
    /// Already eating
    F405_ALREADY_EATING,
}

impl FeedReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::F401_FED => "F401_FED",
            Self::F402_LEVELED_UP => "F402_LEVELED_UP",
            Self::F403_LEVEL_CAPPED => "F403_LEVEL_CAPPED",
            Self::F404_NO_FOOD => "F404_NO_FOOD",
            Self::F405_ALREADY_EATING => "F405_ALREADY_EATING",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::F401_FED => "Yum!",
            Self::F402_LEVELED_UP => "Your companion grew up!",
            Self::F403_LEVEL_CAPPED => "Fully grown - still hungry",
            Self::F404_NO_FOOD => "Earn bones in lessons",
            Self::F405_ALREADY_EATING => "Still eating",
        }
    }

    /// Did food change hands?
    pub fn fed(&self) -> bool {
        matches!(self, Self::F401_FED | Self::F402_LEVELED_UP | Self::F403_LEVEL_CAPPED)
    }
}

impl std::fmt::Display for FeedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Session command reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum SessionReason {
    /// Profile stored
    S501_PROFILE_SET,
    /// No profile yet
    S502_NO_PROFILE,
    /// Same kind of request already outstanding
    S503_REQUEST_PENDING,
    /// New course committed
    S504_COURSE_READY,
    /// Generator produced nothing usable, state unchanged
    S505_COURSE_REJECTED,
    /// Generator failed, state unchanged
    S506_GENERATION_FAILED,
    /// Response belongs to a superseded request
    S507_STALE_RESPONSE,
    /// No active course
    S508_NO_COURSE,
    /// Lesson id not in the course
    S509_UNKNOWN_LESSON,
    /// Lesson still locked
    S510_LESSON_LOCKED,
    /// A lesson attempt is already running
    S511_LESSON_ACTIVE,
    /// Lesson content loaded, attempt started
    S512_LESSON_READY,
    /// No lesson attempt running
    S513_NO_ACTIVE_LESSON,
    /// Quiz command forwarded to the active attempt
    S514_QUIZ_UPDATED,
    /// Lesson completed and credited
    S515_LESSON_CREDITED,
    /// Lesson attempt left without credit
    S516_LESSON_EXITED,
    /// Feeding handled
    S517_FEED_HANDLED,
    /// Level-up notice dismissed
    S518_NOTICE_DISMISSED,
    /// Course cleared, ledger kept
    S519_COURSE_CLEARED,
    /// Timer applied
    S520_TIMER_APPLIED,
    /// Timer stale, discarded
    S521_TIMER_STALE,
    /// Idle observation handled
    S522_IDLE_OBSERVED,
    /// Lesson content could not be loaded
    S523_LESSON_UNAVAILABLE,
}

impl SessionReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::S501_PROFILE_SET => "S501_PROFILE_SET",
            Self::S502_NO_PROFILE => "S502_NO_PROFILE",
            Self::S503_REQUEST_PENDING => "S503_REQUEST_PENDING",
            Self::S504_COURSE_READY => "S504_COURSE_READY",
            Self::S505_COURSE_REJECTED => "S505_COURSE_REJECTED",
            Self::S506_GENERATION_FAILED => "S506_GENERATION_FAILED",
            Self::S507_STALE_RESPONSE => "S507_STALE_RESPONSE",
            Self::S508_NO_COURSE => "S508_NO_COURSE",
            Self::S509_UNKNOWN_LESSON => "S509_UNKNOWN_LESSON",
            Self::S510_LESSON_LOCKED => "S510_LESSON_LOCKED",
            Self::S511_LESSON_ACTIVE => "S511_LESSON_ACTIVE",
            Self::S512_LESSON_READY => "S512_LESSON_READY",
            Self::S513_NO_ACTIVE_LESSON => "S513_NO_ACTIVE_LESSON",
            Self::S514_QUIZ_UPDATED => "S514_QUIZ_UPDATED",
            Self::S515_LESSON_CREDITED => "S515_LESSON_CREDITED",
            Self::S516_LESSON_EXITED => "S516_LESSON_EXITED",
            Self::S517_FEED_HANDLED => "S517_FEED_HANDLED",
            Self::S518_NOTICE_DISMISSED => "S518_NOTICE_DISMISSED",
            Self::S519_COURSE_CLEARED => "S519_COURSE_CLEARED",
            Self::S520_TIMER_APPLIED => "S520_TIMER_APPLIED",
            Self::S521_TIMER_STALE => "S521_TIMER_STALE",
            Self::S522_IDLE_OBSERVED => "S522_IDLE_OBSERVED",
            Self::S523_LESSON_UNAVAILABLE => "S523_LESSON_UNAVAILABLE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::S501_PROFILE_SET => "Profile saved",
            Self::S502_NO_PROFILE => "Tell us your goal first",
            Self::S503_REQUEST_PENDING => "Still working on the previous request",
            Self::S504_COURSE_READY => "Course ready",
            Self::S505_COURSE_REJECTED => "We couldn't generate a course for that goal. Please try being more specific.",
            Self::S506_GENERATION_FAILED => "Something went wrong connecting to the AI tutor.",
            Self::S507_STALE_RESPONSE => "Response arrived too late",
            Self::S508_NO_COURSE => "No course yet",
            Self::S509_UNKNOWN_LESSON => "Lesson not found",
            Self::S510_LESSON_LOCKED => "Lesson is locked",
            Self::S511_LESSON_ACTIVE => "A lesson is already open",
            Self::S512_LESSON_READY => "Lesson ready",
            Self::S513_NO_ACTIVE_LESSON => "No lesson open",
            Self::S514_QUIZ_UPDATED => "Quiz updated",
            Self::S515_LESSON_CREDITED => "Lesson complete",
            Self::S516_LESSON_EXITED => "Returned to course",
            Self::S517_FEED_HANDLED => "Feeding handled",
            Self::S518_NOTICE_DISMISSED => "Notice dismissed",
            Self::S519_COURSE_CLEARED => "Course cleared, XP and badges kept",
            Self::S520_TIMER_APPLIED => "Timer applied",
            Self::S521_TIMER_STALE => "Stale timer discarded",
            Self::S522_IDLE_OBSERVED => "Idle time observed",
            Self::S523_LESSON_UNAVAILABLE => "Could not load lesson content.",
        }
    }
}

impl std::fmt::Display for SessionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
