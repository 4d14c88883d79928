use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequestParts, OptionalFromRequestParts, Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::error;

use super::courses::CourseService;
use super::models::{Actor, CourseContent, ProposalAction, ProposalFields, ProposalStatus, Role};
use super::repository::Repositories;
use super::service::ProposalService;
use super::validate;
use crate::config::Limits;
use crate::errors::{CatalogError, ErrorKind};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub proposals: ProposalService,
    pub courses: CourseService,
    pub limits: Limits,
}

impl AppState {
    pub fn new(repos: &Repositories, limits: Limits) -> Self {
        Self {
            proposals: ProposalService::new(repos),
            courses: CourseService::new(repos.courses.clone()),
            limits,
        }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ActionRequest {
    #[serde(default, alias = "notes")]
    pub review_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default, alias = "notes")]
    pub review_notes: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// Carries whatever the caller needs to recover: the status the request
    /// was evaluated against, or the course that already exists.
    Conflict {
        message: String,
        status: Option<ProposalStatus>,
        course_id: Option<i64>,
    },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({"error": msg})),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({"error": msg}))
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, serde_json::json!({"error": msg}))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, serde_json::json!({"error": msg})),
            ApiError::Conflict {
                message,
                status,
                course_id,
            } => {
                let mut body = serde_json::json!({"error": message});
                if let Some(status) = status {
                    body["status"] = serde_json::json!(status);
                }
                if let Some(course_id) = course_id {
                    body["course_id"] = serde_json::json!(course_id);
                }
                (StatusCode::CONFLICT, body)
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": "Internal server error"}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => ApiError::BadRequest(message),
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::Forbidden => ApiError::Forbidden(message),
            ErrorKind::Conflict => ApiError::Conflict {
                status: err.current_status(),
                course_id: err.existing_course_id(),
                message,
            },
            ErrorKind::Internal => ApiError::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// ── Actor extraction ──────────────────────────────────────────────────

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// `Ok(None)` when no actor id was sent. A present but unparseable header is
/// rejected rather than treated as anonymous.
fn actor_from_headers(headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
    let Some(raw_id) = headers.get(ACTOR_ID_HEADER) else {
        return Ok(None);
    };
    let id = raw_id
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} header", ACTOR_ID_HEADER)))?;
    let role = match headers.get(ACTOR_ROLE_HEADER) {
        None => Role::Student,
        Some(raw) => raw
            .to_str()
            .ok()
            .and_then(|s| Role::from_str(s.trim()).ok())
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid {} header", ACTOR_ROLE_HEADER))
            })?,
    };
    Ok(Some(Actor { id, role }))
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)?.ok_or_else(|| {
            ApiError::Unauthorized(format!("Missing {} header", ACTOR_ID_HEADER))
        })
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        actor_from_headers(&parts.headers)
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/proposals", get(list_proposals).post(create_proposal))
        .route("/api/proposals/mine", get(list_my_proposals))
        .route(
            "/api/proposals/{id}",
            get(get_proposal)
                .patch(update_proposal)
                .delete(delete_proposal),
        )
        .route("/api/proposals/{id}/actions/{action}", post(proposal_action))
        .route("/api/proposals/{id}/status", post(set_proposal_status))
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/mine", get(list_my_courses))
        .route("/api/courses/{id}", get(get_course).patch(update_course))
        .route("/api/courses/{id}/publish", post(publish_course))
        .route("/api/courses/{id}/actions/publish", post(publish_course))
        .route("/health", get(health_check))
}

/// Empty bodies mean "no notes"; anything else must be a JSON object.
fn parse_action_body(body: &Bytes) -> Result<ActionRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ActionRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid action body: {}", e)))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_proposals(
    State(state): State<SharedState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.proposals.list(&actor).await?))
}

async fn list_my_proposals(
    State(state): State<SharedState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.proposals.list_mine(&actor).await?))
}

async fn create_proposal(
    State(state): State<SharedState>,
    actor: Actor,
    payload: Result<Json<ProposalFields>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(fields) = payload?;
    validate::proposal_fields(&fields, &state.limits)?;
    let proposal = state.proposals.create(&actor, fields).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

async fn get_proposal(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.proposals.get(&actor, id).await?))
}

async fn update_proposal(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<ProposalFields>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(fields) = payload?;
    validate::proposal_fields(&fields, &state.limits)?;
    state.proposals.update(&actor, id, fields).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_proposal(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.proposals.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn proposal_action(
    State(state): State<SharedState>,
    actor: Actor,
    Path((id, action)): Path<(i64, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if action == "create-course" {
        let course = state.proposals.materialize_course(&actor, id).await?;
        return Ok((StatusCode::CREATED, Json(course)).into_response());
    }

    let action =
        ProposalAction::from_str(&action).map_err(|_| CatalogError::UnknownAction(action))?;
    let request = parse_action_body(&body)?;
    state
        .proposals
        .apply_action(&actor, id, action, request.review_notes)
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Older clients name the target status instead of the action.
async fn set_proposal_status(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let action = ProposalAction::for_target_status(request.status.trim())
        .ok_or_else(|| CatalogError::UnknownAction(request.status.clone()))?;
    state
        .proposals
        .apply_action(&actor, id, action, request.review_notes)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_courses(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.courses.list_published().await?))
}

async fn list_my_courses(
    State(state): State<SharedState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.courses.list_mine(&actor).await?))
}

async fn create_course(
    State(state): State<SharedState>,
    actor: Actor,
    payload: Result<Json<CourseContent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(content) = payload?;
    validate::course_content(&content, &state.limits)?;
    let course = state.courses.create_direct(&actor, content).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course(
    State(state): State<SharedState>,
    actor: Option<Actor>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.courses.get(actor.as_ref(), id).await?))
}

async fn update_course(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<CourseContent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(content) = payload?;
    validate::course_content(&content, &state.limits)?;
    state.courses.update_content(&actor, id, content).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish_course(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.courses.publish(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Tests ─────────────────────────────────────────────────────────────
