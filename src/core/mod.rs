//! Core modules for the lesson engine

pub mod answer;
pub mod shuffle;
pub mod hearts;
pub mod quiz;
pub mod ledger;
pub mod rewards;
pub mod session;
pub mod view;
pub mod catalog;
pub mod content;
pub mod gemini;
pub mod api;

pub use answer::{check_choice, find_pair};
pub use shuffle::{Shuffler, RandomShuffler, IdentityShuffler};
pub use hearts::HeartTracker;
pub use quiz::{QuizEngine, MatchBoard, Side};
pub use ledger::{complete_lesson, LessonCompletion};
pub use rewards::{evaluate_badge, award_badge, credit_lesson, feed, FeedOutcome};
pub use session::{Session, SessionCommand, SessionOutput, RequestTicket, CourseJob, LessonJob, ActiveLesson};
pub use view::{DashboardView, LessonView, QuestionView, BoardView};
pub use content::{ContentGenerator, ModelClient, fallback_lesson};
pub use gemini::GeminiClient;
pub use api::{create_router, run_server};
