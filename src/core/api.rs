//! HTTP + WebSocket API for the lesson engine
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/new - Create new session (optional profile)
//! - GET /session/{id} - Dashboard view
//! - DELETE /session/{id} - End the session
//! - PUT /session/{id}/profile - Set goal and background
//! - POST /session/{id}/course - Generate a course for the profile goal
//! - DELETE /session/{id}/course - Clear the course, keep XP and badges
//! - POST /session/{id}/lesson/{lesson_id} - Load a lesson and open it
//! - POST /session/{id}/command - Apply a `SessionCommand`
//! - WS /ws/{id} - Live updates
//!
//! Generator calls run without holding the session lock, in a spawned task
//! that always finishes the request ticket, even when the client hangs up.
//! The ticket makes the late response safe to apply or discard.

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::core::content::ContentGenerator;
use crate::core::session::{CourseJob, LessonJob, Session, SessionCommand, SessionOutput};
use crate::core::view::DashboardView;
use crate::types::{SessionReason, Timer, UserProfile};

/// One learner's session plus its live-update channel
pub struct SessionEntry {
    pub session: Session,
    pub update_tx: broadcast::Sender<SessionUpdate>,
}

impl SessionEntry {
    fn broadcast(&self, reason: SessionReason) {
        if self.update_tx.receiver_count() == 0 {
            return;
        }
        let _ = self.update_tx.send(SessionUpdate {
            reason,
            view: DashboardView::of(&self.session),
        });
    }
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub reason: SessionReason,
    pub view: DashboardView,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, SessionEntry>>,
    pub generator: ContentGenerator,
    pub config: AppConfig,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub profile: Option<UserProfile>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Result of a mutation plus the state it left behind
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub output: SessionOutput,
    pub view: DashboardView,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
    pub generator_online: bool,
}

/// Error body: one-shot message for the shell to show
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn no_session() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                code: "SESSION_NOT_FOUND".to_string(),
                message: "Session not found".to_string(),
            },
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        error!(error = %e, "generation task failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                code: "TASK_FAILED".to_string(),
                message: "Request could not be completed".to_string(),
            },
        }
    }
}

impl From<SessionReason> for ApiError {
    fn from(reason: SessionReason) -> Self {
        Self {
            status: status_for(reason),
            body: ErrorBody {
                code: reason.code().to_string(),
                message: reason.description().to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult = Result<Json<CommandResponse>, ApiError>;

/// HTTP status for a session reason that did not succeed
pub fn status_for(reason: SessionReason) -> StatusCode {
    match reason {
        SessionReason::S502_NO_PROFILE => StatusCode::BAD_REQUEST,
        SessionReason::S508_NO_COURSE
        | SessionReason::S509_UNKNOWN_LESSON
        | SessionReason::S513_NO_ACTIVE_LESSON => StatusCode::NOT_FOUND,
        SessionReason::S503_REQUEST_PENDING
        | SessionReason::S507_STALE_RESPONSE
        | SessionReason::S510_LESSON_LOCKED
        | SessionReason::S511_LESSON_ACTIVE => StatusCode::CONFLICT,
        SessionReason::S505_COURSE_REJECTED => StatusCode::UNPROCESSABLE_ENTITY,
        SessionReason::S506_GENERATION_FAILED | SessionReason::S523_LESSON_UNAVAILABLE => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    }
}

/// Create the API router
pub fn create_router(config: AppConfig, generator: ContentGenerator) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        generator,
        config,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/profile", put(set_profile))
        .route("/session/:id/course", post(generate_course).delete(clear_course))
        .route("/session/:id/lesson/:lesson_id", post(open_lesson))
        .route("/session/:id/command", post(apply_command))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
        generator_online: state.generator.is_online(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    req: Option<Json<NewSessionRequest>>,
) -> Json<NewSessionResponse> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let mut session = Session::new(state.config.shuffler());
    if let Some(profile) = req.profile {
        session.set_profile(profile);
    }
    let session_id = session.id().to_string();
    let (tx, _) = broadcast::channel(100);

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), SessionEntry { session, update_tx: tx });
    info!(session = %session_id, active = sessions.len(), "session created");

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    })
}

/// Dashboard view
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DashboardView>, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or_else(ApiError::no_session)?;
    Ok(Json(DashboardView::of(&entry.session)))
}

/// Drop the session; in-flight requests and timers for it become no-ops
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write().await;
    sessions.remove(&id).ok_or_else(ApiError::no_session)?;
    info!(session = %id, active = sessions.len(), "session ended");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(profile): Json<UserProfile>,
) -> ApiResult {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
    let out = entry.session.set_profile(profile);
    commit(&state, entry, out)
}

async fn generate_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let job = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
        let job = entry.session.begin_course_request()?;
        entry.broadcast(SessionReason::S503_REQUEST_PENDING);
        job
    };

    tokio::spawn(finish_course(state, id, job)).await?
}

/// Runs detached from the handler so the ticket is finished even if the
/// client goes away
async fn finish_course(state: Arc<AppState>, id: String, job: CourseJob) -> ApiResult {
    let result = state.generator.generate_course_outline(&job.profile).await;

    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
    let out = entry.session.finish_course_request(job.ticket, result);
    commit(&state, entry, out)
}

async fn clear_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
    let out = entry.session.apply(SessionCommand::ClearCourse);
    commit(&state, entry, out)
}

async fn open_lesson(
    State(state): State<Arc<AppState>>,
    Path((id, lesson_id)): Path<(String, String)>,
) -> ApiResult {
    let job = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
        entry.session.begin_lesson_request(&lesson_id)?
    };

    tokio::spawn(finish_lesson(state, id, lesson_id, job)).await?
}

async fn finish_lesson(state: Arc<AppState>, id: String, lesson_id: String, job: LessonJob) -> ApiResult {
    let result = state
        .generator
        .generate_lesson_content(&job.topic, &job.lesson, job.profile.as_ref())
        .await;

    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
    let out = entry.session.finish_lesson_request(job.ticket, &lesson_id, result);
    commit(&state, entry, out)
}

async fn apply_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(command): Json<SessionCommand>,
) -> ApiResult {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or_else(ApiError::no_session)?;
    let out = entry.session.apply(command);
    commit(&state, entry, out)
}

/// Schedule follow-up timers, notify watchers, shape the response
fn commit(state: &Arc<AppState>, entry: &mut SessionEntry, mut out: SessionOutput) -> ApiResult {
    let timers = std::mem::take(&mut out.timers);
    schedule_timers(state, entry.session.id(), timers);
    entry.broadcast(out.reason);

    if !out.is_ok() {
        return Err(out.reason.into());
    }
    Ok(Json(CommandResponse {
        view: DashboardView::of(&entry.session),
        output: out,
    }))
}

/// Deliver each timer back through `Session::fire` once it expires
fn schedule_timers(state: &Arc<AppState>, session_id: &str, timers: Vec<Timer>) {
    for timer in timers {
        let state = Arc::clone(state);
        let id = session_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(timer.delay()).await;
            let mut sessions = state.sessions.write().await;
            let Some(entry) = sessions.get_mut(&id) else {
                debug!(session = %id, "timer for dropped session");
                return;
            };
            let out = entry.session.fire(timer);
            if out.is_ok() {
                entry.broadcast(out.reason);
            }
        });
    }
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or_else(ApiError::no_session)?;
    let rx = entry.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<SessionUpdate>) {
    while let Ok(update) = rx.recv().await {
        let json = serde_json::to_string(&update).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Run the API server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let generator = config.content_generator()?;
    let addr = config.addr.clone();
    let router = create_router(config, generator);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "lesson engine API listening");
    println!("Lesson engine API running on {}", addr);
    println!("  POST   /session/new                  - Create session");
    println!("  GET    /session/:id                  - Dashboard view");
    println!("  DELETE /session/:id                  - End session");
    println!("  PUT    /session/:id/profile          - Set profile");
    println!("  POST   /session/:id/course           - Generate course");
    println!("  DELETE /session/:id/course           - Clear course");
    println!("  POST   /session/:id/lesson/:lesson   - Open lesson");
    println!("  POST   /session/:id/command          - Apply command");
    println!("  WS     /ws/:id                       - Live updates");
    println!("  GET    /health                       - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
