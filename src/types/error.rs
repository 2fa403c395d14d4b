//! Error types for content loading and generation

use thiserror::Error;

/// Structural problems in lesson content
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("lesson has no questions")]
    NoQuestions,

    #[error("question {question_id} has no options")]
    EmptyOptions { question_id: String },

    #[error("question {question_id} has a malformed pair: {option:?}")]
    MalformedPair { question_id: String, option: String },

    #[error("question {question_id} repeats the matching term {term:?}")]
    DuplicateTerm { question_id: String, term: String },

    #[error("lesson content has no matching question")]
    NoMatchingQuestion,
}

/// Failures talking to the content generator
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API key missing")]
    MissingApiKey,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no candidate text")]
    EmptyResponse,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid content: {0}")]
    Content(#[from] ContentError),
}

