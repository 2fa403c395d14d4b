//! Content generator: course outlines and lesson content
//!
//! Outline: catalog goals short-circuit; otherwise the model is asked for a
//! schema-constrained outline which is hydrated with ids, colours and lock
//! state. Transport failures propagate, unusable output yields `None`.
//!
//! Lesson: pre-baked content is returned verbatim; otherwise the model is
//! asked for theory plus questions. Any failure after the request is made
//! falls back to a one-question placeholder so the runner always gets a
//! playable lesson.

use std::sync::Arc;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::catalog;
use crate::types::{
    ContentError, Course, GenerationError, Lesson, LessonContent, Question, QuestionType, Unit,
    UserProfile,
};
use crate::MATCH_ALL;

/// Cycled over units in order
pub const UNIT_PALETTE: [&str; 5] = ["bg-brand", "bg-purple-500", "bg-orange-500", "bg-pink-500", "bg-sky-500"];

/// A text model that answers with JSON matching `schema`
pub trait ModelClient: Send + Sync {
    fn generate_json<'a>(&'a self, prompt: &'a str, schema: &'a Value) -> BoxFuture<'a, Result<String, GenerationError>>;
}

#[derive(Clone, Default)]
pub struct ContentGenerator {
    client: Option<Arc<dyn ModelClient>>,
}

impl std::fmt::Debug for ContentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGenerator")
            .field("online", &self.client.is_some())
            .finish()
    }
}

impl ContentGenerator {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client: Some(client) }
    }

    /// Catalog and pre-baked content only
    pub fn offline() -> Self {
        Self { client: None }
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Arc<dyn ModelClient>, GenerationError> {
        self.client.as_ref().ok_or(GenerationError::MissingApiKey)
    }

    pub async fn generate_course_outline(&self, profile: &UserProfile) -> Result<Option<Course>, GenerationError> {
        if let Some(course) = catalog::lookup(&profile.goal) {
            info!(topic = %course.topic, "goal matched static catalog");
            return Ok(Some(course));
        }

        let client = self.client()?;
        let prompt = outline_prompt(profile);
        let text = client.generate_json(&prompt, &outline_schema()).await?;

        let course = parse_outline(&text);
        if course.is_none() {
            warn!(goal = %profile.goal, "model outline unusable");
        }
        Ok(course)
    }

    pub async fn generate_lesson_content(
        &self,
        topic: &str,
        lesson: &Lesson,
        profile: Option<&UserProfile>,
    ) -> Result<LessonContent, GenerationError> {
        if let Some(content) = &lesson.content {
            return Ok(content.clone());
        }

        let client = self.client()?;
        let prompt = lesson_prompt(topic, lesson, profile);
        let generated = client
            .generate_json(&prompt, &lesson_schema())
            .await
            .and_then(|text| parse_lesson(&text));

        match generated {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!(lesson = %lesson.title, error = %e, "lesson generation failed, using fallback");
                Ok(fallback_lesson())
            }
        }
    }
}

// =============================================================================
// PROMPTS
// =============================================================================

pub fn outline_prompt(profile: &UserProfile) -> String {
    format!(
        "Create a structured course outline for a learner with this profile:\n\
         Goal: {}\n\
         Background: {}\n\n\
         Requirements:\n\
         1. Course topic name: professional and concise.\n\
         2. Structure: exactly 3 units.\n\
         3. Content: 2-3 lessons per unit.\n\
         4. Tone: educational and encouraging.",
        profile.goal, profile.background
    )
}

pub fn lesson_prompt(topic: &str, lesson: &Lesson, profile: Option<&UserProfile>) -> String {
    let adaptation = profile
        .map(|p| {
            format!(
                "\nAdaptation: the learner is a {} trying to {}. \
                 Use analogies from their background where possible.\n",
                p.background, p.goal
            )
        })
        .unwrap_or_default();

    format!(
        "Create content for the lesson \"{}\" in the course \"{}\".\n{}\
         1. Theory: a clear, bite-sized explanation in Markdown.\n\
         2. Questions: 3 interactive questions mixing MULTIPLE_CHOICE, TRUE_FALSE, FILL_IN_BLANK and MATCHING.\n\
         For MATCHING questions give exactly 3 pairs in options using the '::' separator.\n\
         Keep the tone encouraging.",
        lesson.title, topic, adaptation
    )
}

// =============================================================================
// SCHEMAS
// =============================================================================

pub fn outline_schema() -> Value {
    let lesson = json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" }
        },
        "required": ["title", "description"]
    });
    let unit = json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "lessons": { "type": "ARRAY", "items": lesson }
        },
        "required": ["title", "description", "lessons"]
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": { "type": "STRING" },
            "units": { "type": "ARRAY", "items": unit }
        },
        "required": ["topic", "units"]
    })
}

pub fn lesson_schema() -> Value {
    let question = json!({
        "type": "OBJECT",
        "properties": {
            "type": {
                "type": "STRING",
                "enum": ["MULTIPLE_CHOICE", "TRUE_FALSE", "FILL_IN_BLANK", "MATCHING"]
            },
            "prompt": {
                "type": "STRING",
                "description": "The question text. For MATCHING, say 'Match the pairs'."
            },
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "MULTIPLE_CHOICE/TRUE_FALSE: the choices. MATCHING: 'Term :: Definition' strings. FILL_IN_BLANK: the word bank."
            },
            "correctAnswer": {
                "type": "STRING",
                "description": "The exact correct option. For MATCHING use 'MATCH_ALL'."
            },
            "explanation": { "type": "STRING", "description": "Why this answer is correct." }
        },
        "required": ["type", "prompt", "options", "correctAnswer", "explanation"]
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "theory": {
                "type": "STRING",
                "description": "A short engaging explanation of the key concepts (about 150 words). Use Markdown."
            },
            "questions": {
                "type": "ARRAY",
                "items": question,
                "description": "3 questions testing the theory. Always include at least one MATCHING question."
            }
        },
        "required": ["theory", "questions"]
    })
}

// =============================================================================
// PARSING AND HYDRATION
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawOutline {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    units: Vec<RawUnit>,
}

#[derive(Debug, Deserialize)]
struct RawUnit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    lessons: Vec<RawLesson>,
}

#[derive(Debug, Deserialize)]
struct RawLesson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Hydrate a model outline; `None` when it has no topic or no lessons
pub fn parse_outline(text: &str) -> Option<Course> {
    let raw: RawOutline = serde_json::from_str(text).ok()?;
    if raw.topic.trim().is_empty() {
        return None;
    }

    let units: Vec<Unit> = raw
        .units
        .into_iter()
        .filter(|u| !u.lessons.is_empty())
        .enumerate()
        .map(|(u_idx, unit)| Unit {
            id: Uuid::new_v4().to_string(),
            title: unit.title,
            description: unit.description,
            color: UNIT_PALETTE[u_idx % UNIT_PALETTE.len()].to_string(),
            lessons: unit
                .lessons
                .into_iter()
                .enumerate()
                .map(|(l_idx, lesson)| Lesson {
                    id: Uuid::new_v4().to_string(),
                    title: lesson.title,
                    description: lesson.description,
                    is_completed: false,
                    // Only the very first lesson starts open
                    is_locked: !(u_idx == 0 && l_idx == 0),
                    content: None,
                })
                .collect(),
        })
        .collect();

    if units.is_empty() {
        return None;
    }
    Some(Course {
        id: Uuid::new_v4().to_string(),
        topic: raw.topic,
        units,
    })
}

#[derive(Debug, Deserialize)]
struct RawLessonContent {
    #[serde(default)]
    theory: String,
    #[serde(default)]
    questions: Vec<Value>,
}

/// Keep the well-formed questions; at least one must be matching
pub fn parse_lesson(text: &str) -> Result<LessonContent, GenerationError> {
    let raw: RawLessonContent = serde_json::from_str(text)?;

    let questions: Vec<Question> = raw
        .questions
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Question>(v).ok())
        .map(|mut q| {
            q.id = Uuid::new_v4().to_string();
            if q.kind.is_matching() {
                q.correct_answer = MATCH_ALL.to_string();
            }
            q
        })
        .filter(is_playable)
        .collect();

    let content = LessonContent { theory: raw.theory, questions };
    content.validate()?;
    if !content.has_matching() {
        return Err(ContentError::NoMatchingQuestion.into());
    }
    Ok(content)
}

/// Structurally valid, and a choice question must offer its own answer
fn is_playable(question: &Question) -> bool {
    if question.validate().is_err() {
        return false;
    }
    question.kind.is_matching() || question.options.contains(&question.correct_answer)
}

/// Always-playable placeholder lesson
pub fn fallback_lesson() -> LessonContent {
    let mut question = Question::choice(
        "fallback-1",
        QuestionType::TrueFalse,
        "Gemini helps power this app.",
        &["True", "False"],
        "True",
    );
    question.explanation = Some("It's the model working behind the scenes.".to_string());
    LessonContent {
        theory: "The lesson text isn't available right now, but you can still try the question!".to_string(),
        questions: vec![question],
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_hydration() {
        let text = r#"{"topic":"Rust","units":[
            {"title":"A","description":"a","lessons":[{"title":"A1","description":""},{"title":"A2","description":""}]},
            {"title":"B","description":"b","lessons":[{"title":"B1","description":""}]}
        ]}"#;
        let course = parse_outline(text).unwrap();
        assert_eq!(course.topic, "Rust");
        assert_eq!(course.units[0].color, "bg-brand");
        assert_eq!(course.units[1].color, "bg-purple-500");
        let locks: Vec<bool> = course.lessons().map(|l| l.is_locked).collect();
        assert_eq!(locks, vec![false, true, true]);
        assert!(course.lessons().all(|l| !l.is_completed && Uuid::parse_str(&l.id).is_ok()));
    }

    #[test]
    fn test_palette_cycles() {
        let units: Vec<String> = (0..6)
            .map(|i| format!(r#"{{"title":"U{}","lessons":[{{"title":"L"}}]}}"#, i))
            .collect();
        let text = format!(r#"{{"topic":"T","units":[{}]}}"#, units.join(","));
        let course = parse_outline(&text).unwrap();
        assert_eq!(course.units[5].color, "bg-brand");
    }

    #[test]
    fn test_outline_rejects_malformed() {
        assert!(parse_outline("not json").is_none());
        assert!(parse_outline(r#"{"units":[]}"#).is_none());
        assert!(parse_outline(r#"{"topic":"T","units":[]}"#).is_none());
        assert!(parse_outline(r#"{"topic":"T","units":[{"title":"Empty","lessons":[]}]}"#).is_none());
    }

    #[test]
    fn test_lesson_drops_broken_questions() {
        let text = r#"{"theory":"t","questions":[
            {"type":"MATCHING","prompt":"Match","options":["a :: 1","b :: 2","c :: 3"],"correctAnswer":""},
            {"type":"MULTIPLE_CHOICE","prompt":"?","options":["x","y"],"correctAnswer":"z"},
            {"type":"ESSAY","prompt":"?","options":["x"],"correctAnswer":"x"},
            {"type":"TRUE_FALSE","prompt":"?","options":["True","False"],"correctAnswer":"False"}
        ]}"#;
        let content = parse_lesson(text).unwrap();
        assert_eq!(content.questions.len(), 2);
        assert_eq!(content.questions[0].correct_answer, MATCH_ALL);
        assert_ne!(content.questions[0].id, content.questions[1].id);
    }

    #[test]
    fn test_lesson_drops_matching_with_repeated_pairs() {
        let text = r#"{"theory":"t","questions":[
            {"type":"MATCHING","prompt":"Match","options":["a :: 1","a :: 1","b :: 2"],"correctAnswer":"MATCH_ALL"},
            {"type":"MATCHING","prompt":"Match","options":["x :: 7","y :: 8","z :: 9"],"correctAnswer":"MATCH_ALL"}
        ]}"#;
        let content = parse_lesson(text).unwrap();
        assert_eq!(content.questions.len(), 1);
        assert_eq!(content.questions[0].options[0], "x :: 7");

        let only_broken = r#"{"theory":"t","questions":[
            {"type":"MATCHING","prompt":"Match","options":["a :: 1","a :: 1","b :: 2"],"correctAnswer":"MATCH_ALL"}
        ]}"#;
        assert!(parse_lesson(only_broken).is_err());
    }

    #[test]
    fn test_lesson_requires_matching() {
        let text = r#"{"theory":"t","questions":[
            {"type":"TRUE_FALSE","prompt":"?","options":["True","False"],"correctAnswer":"True"}
        ]}"#;
        assert!(matches!(
            parse_lesson(text),
            Err(GenerationError::Content(ContentError::NoMatchingQuestion))
        ));
    }

    #[test]
    fn test_fallback_is_playable() {
        let fallback = fallback_lesson();
        fallback.validate().unwrap();
        assert_eq!(fallback.questions[0].correct_answer, "True");
    }

    #[test]
    fn test_prompt_adapts_to_profile() {
        let lesson = Lesson::new("l", "Ownership", false);
        let profile = UserProfile::new("learn Rust", "Python developer");
        let prompt = lesson_prompt("Rust", &lesson, Some(&profile));
        assert!(prompt.contains("Python developer"));
        assert!(prompt.contains("\"Ownership\""));
        assert!(!lesson_prompt("Rust", &lesson, None).contains("Adaptation"));
    }
}
