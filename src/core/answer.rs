//! Answer checking for the four question variants
//!
//! - Choice questions: exact text match against `correct_answer`
//! - Matching: each (left, right) candidate is checked on its own against
//!   the parsed pair catalog

use crate::types::{MatchPair, Question, Verdict};

/// Check a selected option for a multiple choice, true/false or fill-in-blank question
pub fn check_choice(question: &Question, selected: &str) -> Verdict {
    Verdict::from_bool(!question.kind.is_matching() && selected == question.correct_answer)
}

/// Find the catalog pair matching a candidate pairing
pub fn find_pair<'a>(pairs: &'a [MatchPair], left: &str, right: &str) -> Option<&'a MatchPair> {
    pairs.iter().find(|p| p.left == left && p.right == right)
}
