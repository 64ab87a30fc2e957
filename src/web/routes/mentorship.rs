use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::model::entity::{
    Educator, EducatorCreate, MentorshipSession, SessionParty, TransitionDenied, UserEntity,
    valid_session_minutes,
};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::mentorship::{BookingBody, EducatorProfile, SessionStatusBody};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, AuthenticatedUser, RequestContext, WebError, WebResult};

const MAX_HEADLINE_CHARS: usize = 200;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/educators", post(educators_create_handler))
        .route("/educators/{id}", get(educators_get_handler))
        .route("/sessions", get(sessions_list_handler).post(sessions_book_handler))
        .route("/sessions/{id}/status", put(sessions_status_handler))
        .with_state(state)
}

async fn find_educator(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Educator> {
    Educator::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Educator::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Educator::get_resource_type()))
}

#[utoipa::path(
    post,
    path = "/api/v1/mentorship/educators",
    description = "Registers the caller as an educator and promotes their role",
    request_body = EducatorCreate,
    responses(
        (status = 201, description = "Educator profile created", body = Educator),
        (status = 400, description = "Invalid session length or headline", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 409, description = "Already an educator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "mentorship",
    security(("cookie" = []))
)]
pub(crate) async fn educators_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<EducatorCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if !valid_session_minutes(payload.session_minutes) {
        return Err(WebError::invalid_field("session_minutes", "must be 15 to 240 minutes"));
    }
    if payload.headline.trim().chars().count() > MAX_HEADLINE_CHARS {
        return Err(WebError::invalid_field("headline", "must be at most 200 characters"));
    }

    let educator = Educator::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(Educator::get_resource_type(), e))?;
    tracing::info!(user_id = %user.user_id(), educator_id = %educator.id(), "educator registered");

    Ok((StatusCode::CREATED, Json(educator)))
}

#[utoipa::path(
    get,
    path = "/api/v1/mentorship/educators/{educator_id}",
    description = "Educator profile",
    params(("educator_id" = Uuid, Path, description = "ID of the educator")),
    responses(
        (status = 200, description = "Educator found", body = EducatorProfile),
        (status = 404, description = "Educator not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "mentorship"
)]
pub(crate) async fn educators_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let actor = ctx.user_or_guest();
    let educator = find_educator(&state, &actor, id).await?;

    let display_name = UserEntity::find_by_id(state.pool(), &actor, educator.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .map(|u| u.display_name().to_string())
        .unwrap_or_default();

    Ok((StatusCode::OK, Json(EducatorProfile { educator, display_name })))
}

#[utoipa::path(
    post,
    path = "/api/v1/mentorship/sessions",
    description = "Requests a session. Its length is the educator's session length.",
    request_body = BookingBody,
    responses(
        (status = 201, description = "Session requested", body = MentorshipSession),
        (status = 400, description = "Past slot, self booking or inactive educator", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Educator not found", body = ErrorResponse),
        (status = 409, description = "Slot overlaps another session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "mentorship",
    security(("cookie" = []))
)]
pub(crate) async fn sessions_book_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<BookingBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let educator = find_educator(&state, user, payload.educator_id).await?;

    if payload.starts_at <= Utc::now() {
        return Err(WebError::invalid_field("starts_at", "must be in the future"));
    }
    if educator.user_id() == user.user_id() {
        return Err(WebError::invalid_field("educator_id", "cannot book yourself"));
    }
    if !educator.active() {
        return Err(WebError::invalid_field("educator_id", "educator is not taking sessions"));
    }

    let notes = payload.notes.as_deref().unwrap_or_default();
    let session = MentorshipSession::book(state.pool(), user, &educator, payload.starts_at, notes)
        .await
        .map_err(|e| WebError::resource_fetch_error(MentorshipSession::get_resource_type(), e))?
        .ok_or(WebError::resource_conflict(MentorshipSession::get_resource_type()))?;

    tracing::info!(session_id = %session.id(), educator_id = %educator.id(), "session booked");

    let educator_user = UserEntity::find_by_id(state.pool(), user, educator.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    if let Some(to) = educator_user.as_ref().and_then(UserEntity::notification_email) {
        let text = format!(
            "A new mentorship session was requested for {}.",
            session.starts_at().format("%Y-%m-%d %H:%M UTC")
        );
        state.mailer().send_or_log(to, "New session request", &text).await;
    }

    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/v1/mentorship/sessions",
    description = "Sessions the caller takes part in, as student or educator",
    responses(
        (status = 200, description = "Sessions", body = [MentorshipSession]),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "mentorship",
    security(("cookie" = []))
)]
pub(crate) async fn sessions_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let sessions = MentorshipSession::list_mine(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(MentorshipSession::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(sessions)))
}

#[utoipa::path(
    put,
    path = "/api/v1/mentorship/sessions/{session_id}/status",
    description = "Confirms, cancels or completes a session",
    request_body = SessionStatusBody,
    params(("session_id" = Uuid, Path, description = "ID of the session")),
    responses(
        (status = 200, description = "Status changed", body = MentorshipSession),
        (status = 400, description = "Not reachable from the current status", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Not allowed for your side of the session", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session changed concurrently", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "mentorship",
    security(("cookie" = []))
)]
pub(crate) async fn sessions_status_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionStatusBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session_type = MentorshipSession::get_resource_type;

    let session = MentorshipSession::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(session_type(), e))?
        .ok_or(WebError::resource_not_found(session_type()))?;
    let educator = find_educator(&state, user, session.educator_id()).await?;

    let party = if educator.user_id() == user.user_id() {
        SessionParty::Educator
    } else if session.student_id() == user.user_id() {
        SessionParty::Student
    } else {
        return Err(WebError::resource_forbidden(session_type()));
    };

    let from = session.status();
    let to = payload.status;
    match from.check_transition(party, to) {
        Ok(()) => {}
        Err(TransitionDenied::NotAllowed) => return Err(WebError::resource_forbidden(session_type())),
        Err(TransitionDenied::InvalidState) => {
            return Err(WebError::invalid_transition(session_type(), from.as_str(), to.as_str()));
        }
    }

    let updated = session
        .set_status(state.pool(), user, to)
        .await
        .map_err(|e| WebError::resource_fetch_error(session_type(), e))?
        .ok_or(WebError::resource_conflict(session_type()))?;

    tracing::debug!(session_id = %id, from = from.as_str(), to = to.as_str(), "session status changed");
    Ok((StatusCode::OK, Json(updated)))
}
