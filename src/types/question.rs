//! Question model: the four question variants and their pair encoding

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use crate::types::ContentError;
use crate::{MATCH_ALL, PAIR_SEPARATOR};

/// Supported question variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Pick one of several options
    MultipleChoice,
    /// Pick "True" or "False"
    TrueFalse,
    /// Pick the missing word from a word bank
    FillInBlank,
    /// Pair every left term with its right counterpart
    Matching,
}

impl QuestionType {
    /// Matching questions have no submit step
    pub fn is_matching(&self) -> bool {
        matches!(self, QuestionType::Matching)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::TrueFalse => "TRUE_FALSE",
            QuestionType::FillInBlank => "FILL_IN_BLANK",
            QuestionType::Matching => "MATCHING",
        };
        write!(f, "{}", name)
    }
}

/// A single quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub prompt: String,
    /// Choices, word bank, or `left :: right` pairs for matching
    pub options: Vec<String>,
    /// Exact option text, or `MATCH_ALL` for matching
    #[serde(default = "match_all")]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

fn match_all() -> String {
    MATCH_ALL.to_string()
}

/// One left/right pair of a matching question
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPair {
    /// The raw option text, used as the pair id
    pub id: String,
    pub left: String,
    pub right: String,
}

impl MatchPair {
    /// Parse `"<left> :: <right>"`; both sides are trimmed
    pub fn parse(option: &str) -> Option<Self> {
        let mut parts = option.split(PAIR_SEPARATOR);
        let left = parts.next()?.trim();
        let right = parts.next()?.trim();
        if parts.next().is_some() || left.is_empty() || right.is_empty() {
            return None;
        }
        Some(Self {
            id: option.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        })
    }
}

impl Question {
    /// Build a matching question from (left, right) pairs
    pub fn matching(id: &str, prompt: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            kind: QuestionType::Matching,
            prompt: prompt.to_string(),
            options: pairs
                .iter()
                .map(|(l, r)| format!("{} {} {}", l, PAIR_SEPARATOR, r))
                .collect(),
            correct_answer: MATCH_ALL.to_string(),
            explanation: None,
        }
    }

    /// Build a choice-style question (multiple choice, true/false, fill-in-blank)
    pub fn choice(id: &str, kind: QuestionType, prompt: &str, options: &[&str], answer: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: answer.to_string(),
            explanation: None,
        }
    }

    /// Parsed pairs in catalog order (empty for non-matching questions)
    pub fn pairs(&self) -> Vec<MatchPair> {
        if !self.kind.is_matching() {
            return Vec::new();
        }
        self.options.iter().filter_map(|o| MatchPair::parse(o)).collect()
    }

    /// Check the structural invariants: non-empty options, well-formed pairs,
    /// and every matching term appearing once per side
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.options.is_empty() {
            return Err(ContentError::EmptyOptions { question_id: self.id.clone() });
        }
        if !self.kind.is_matching() {
            return Ok(());
        }

        let mut lefts = HashSet::new();
        let mut rights = HashSet::new();
        for option in &self.options {
            let pair = MatchPair::parse(option).ok_or_else(|| ContentError::MalformedPair {
                question_id: self.id.clone(),
                option: option.clone(),
            })?;
            // A repeated term could never be matched twice
            if !lefts.insert(pair.left.clone()) {
                return Err(ContentError::DuplicateTerm { question_id: self.id.clone(), term: pair.left });
            }
            if !rights.insert(pair.right.clone()) {
                return Err(ContentError::DuplicateTerm { question_id: self.id.clone(), term: pair.right });
            }
        }
        Ok(())
    }
}

/// Outcome of checking one candidate answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_bool(correct: bool) -> Self {
        if correct { Verdict::Correct } else { Verdict::Incorrect }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}
