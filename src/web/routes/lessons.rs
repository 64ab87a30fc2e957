use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use uuid::Uuid;

use crate::model::entity::{Lesson, LessonWithStatusRow};
use crate::model::progression::{LessonCompletion, complete_lesson};
use crate::model::ResourceTyped;
use crate::web::dto::lessons::LessonResponse;
use crate::web::error::ErrorResponse;
use crate::web::routes::courses::find_visible_course;
use crate::web::{AppState, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}", get(lessons_get_handler))
        .route("/{id}/done", post(lessons_mark_done_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}",
    description = "Lesson content, completion status and the next lesson left to do",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let fetch_err = |e| WebError::resource_fetch_error(Lesson::get_resource_type(), e);

    let lesson = LessonWithStatusRow::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err)?
        .ok_or(WebError::resource_not_found(Lesson::get_resource_type()))?;
    find_visible_course(&state, user, lesson.course_id)
        .await
        .map_err(|_| WebError::resource_not_found(Lesson::get_resource_type()))?;

    let next = LessonWithStatusRow::find_next_uncompleted(state.pool(), user, id)
        .await
        .map_err(fetch_err)?;

    Ok((StatusCode::OK, Json(LessonResponse::new(lesson, next))))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/done",
    description = "Marks the lesson as completed. Updates course progress, grants XP and \
                   issues the certificate when the course is finished. Safe to repeat.",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to mark")
    ),
    responses(
        (status = 200, description = "Lesson marked", body = LessonCompletion),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_mark_done_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let completion = complete_lesson(state.pool(), user, &state.xp_rules(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Lesson::get_resource_type()))?;

    Ok((StatusCode::OK, Json(completion)))
}
