//! Integration tests for the HTTP API
//!
//! Runs the router in-process with the offline generator

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use lesson_engine::config::AppConfig;
use lesson_engine::core::{create_router, ContentGenerator, ModelClient};
use lesson_engine::types::GenerationError;

/// Answers every outline request after a delay
struct SlowModel(Duration);

impl ModelClient for SlowModel {
    fn generate_json<'a>(&'a self, _prompt: &'a str, _schema: &'a Value) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async move {
            tokio::time::sleep(self.0).await;
            Ok(r#"{"topic":"Woodworking","units":[{"title":"Tools","description":"","lessons":[{"title":"Saws","description":""}]}]}"#.to_string())
        })
    }
}

fn create_test_router() -> Router {
    let config = AppConfig { seed: Some(7), ..AppConfig::default() };
    create_router(config, ContentGenerator::offline())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn new_session(app: &Router, goal: &str) -> String {
    let (status, json) = send(app, "POST", "/session/new", Some(json!({ "profile": { "goal": goal } }))).await;
    assert_eq!(status, StatusCode::OK);
    json["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["generator_online"], false);
}

#[tokio::test]
async fn test_create_session_without_body() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/session/new", None).await;
    assert_eq!(status, StatusCode::OK);
    let id = json["session_id"].as_str().unwrap();
    assert_eq!(json["websocket_url"], format!("/ws/{}", id));

    let (status, view) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["profile"], Value::Null);
    assert_eq!(view["ledger"]["food"], 0);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 1);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/session/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "SESSION_NOT_FOUND");

    let (status, _) = send(&app, "POST", "/session/nope/command", Some(json!({ "type": "feed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_requires_profile() {
    let app = create_test_router();
    let (_, json) = send(&app, "POST", "/session/new", None).await;
    let id = json["session_id"].as_str().unwrap();

    let (status, json) = send(&app, "POST", &format!("/session/{}/course", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "S502_NO_PROFILE");

    let profile = json!({ "goal": "marketing", "background": "writer", "petPreference": "cat" });
    let (status, json) = send(&app, "PUT", &format!("/session/{}/profile", id), Some(profile)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["view"]["profile"]["petPreference"], "cat");
}

#[tokio::test]
async fn test_offline_unknown_goal_is_bad_gateway() {
    let app = create_test_router();
    let id = new_session(&app, "pottery").await;
    let (status, json) = send(&app, "POST", &format!("/session/{}/course", id), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "S506_GENERATION_FAILED");
}

#[tokio::test]
async fn test_course_lesson_and_commands() {
    let app = create_test_router();
    let id = new_session(&app, "marketing").await;

    let (status, json) = send(&app, "POST", &format!("/session/{}/course", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"]["reason"], "S504_COURSE_READY");
    assert_eq!(json["view"]["course"]["topic"], "Generative AI Content Creation");
    assert_eq!(json["view"]["ledger"]["food"], 3);

    let (status, json) = send(&app, "POST", &format!("/session/{}/lesson/l2-firefly", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "S510_LESSON_LOCKED");

    let (status, json) = send(&app, "POST", &format!("/session/{}/lesson/l1-what-is-genai", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"]["reason"], "S512_LESSON_READY");
    let lesson = &json["view"]["lesson"];
    assert_eq!(lesson["phase"], "THEORY");
    assert_eq!(lesson["hearts"], 2);

    // Course cannot be cleared mid-lesson
    let (status, _) = send(&app, "DELETE", &format!("/session/{}/course", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let command = format!("/session/{}/command", id);
    let (status, json) = send(&app, "POST", &command, Some(json!({ "type": "start_quiz" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["view"]["lesson"]["phase"], "QUIZ");
    assert_eq!(json["view"]["lesson"]["question"]["type"], "MULTIPLE_CHOICE");

    let pick = json!({ "type": "select_option", "option": "There is no difference" });
    send(&app, "POST", &command, Some(pick)).await;
    let (_, json) = send(&app, "POST", &command, Some(json!({ "type": "submit" }))).await;
    let lesson = &json["view"]["lesson"];
    assert_eq!(lesson["status"], "INCORRECT");
    assert_eq!(lesson["hearts"], 1);
    assert_eq!(lesson["revealed_answer"], "Traditional AI analyzes patterns, Generative AI creates new content");

    let (status, json) = send(&app, "POST", &command, Some(json!({ "type": "exit_lesson" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["view"]["lesson"], Value::Null);
    assert_eq!(json["view"]["ledger"]["food"], 3);

    let (status, json) = send(&app, "DELETE", &format!("/session/{}/course", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["view"]["course"], Value::Null);
}

#[tokio::test]
async fn test_quiz_command_without_lesson() {
    let app = create_test_router();
    let id = new_session(&app, "marketing").await;
    let (status, json) = send(&app, "POST", &format!("/session/{}/command", id), Some(json!({ "type": "submit" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "S513_NO_ACTIVE_LESSON");

    let (status, json) = send(&app, "POST", &format!("/session/{}/command", id), Some(json!({ "type": "feed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"]["feed"]["reason"], "F404_NO_FOOD");
}

#[tokio::test]
async fn test_abandoned_course_request_still_finishes() {
    let generator = ContentGenerator::new(Arc::new(SlowModel(Duration::from_millis(150))));
    let app = create_router(AppConfig::default(), generator);
    let id = new_session(&app, "woodworking").await;
    let course = format!("/session/{}/course", id);

    // Client gives up long before the model answers
    let abandoned = tokio::time::timeout(Duration::from_millis(20), send(&app, "POST", &course, None)).await;
    assert!(abandoned.is_err());

    let (_, view) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(view["loading_course"], true);

    let mut settled = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let (_, view) = send(&app, "GET", &format!("/session/{}", id), None).await;
        if view["loading_course"] == false {
            assert_eq!(view["course"]["topic"], "Woodworking");
            settled = true;
            break;
        }
    }
    assert!(settled, "course request never finished");

    // The learner can ask again
    let (status, json) = send(&app, "POST", &course, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"]["reason"], "S504_COURSE_READY");
}

#[tokio::test]
async fn test_delete_session() {
    let app = create_test_router();
    let id = new_session(&app, "marketing").await;

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 0);

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
