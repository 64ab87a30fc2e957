use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::model::entity::{
    Course, CourseWithProgressRow, Enrollment, Lesson, LessonProgress, ModuleWithLessonsRow, Quiz,
    QuizAnswer, QuizQuestion,
};
use crate::model::gamification::progress_pct;
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::modules::{CourseOutline, ModuleWithLessons};
use crate::web::dto::quizzes::QuizView;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, AuthenticatedUser, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler))
        .route("/{id}", get(courses_get_handler))
        .route("/{id}/enroll", post(courses_enroll_handler))
        .route("/{id}/quiz", get(courses_quiz_handler))
        .with_state(state)
}

/// Published course, or any course for admins.
pub(crate) async fn find_visible_course(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    Course::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .filter(|c| c.visible_to(actor))
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/",
    description = "Course catalog with the caller's progress",
    responses(
        (status = 200, description = "Courses", body = [CourseWithProgressRow]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn courses_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let actor = ctx.user_or_guest();
    let courses = CourseWithProgressRow::fetch_all(state.pool(), &actor)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    description = "Course outline: modules and lessons in order, with completion flags",
    params(("course_id" = Uuid, Path, description = "ID of the course")),
    responses(
        (status = 200, description = "Course found", body = CourseOutline),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let actor = ctx.user_or_guest();
    let course = find_visible_course(&state, &actor, id).await?;

    let fetch_err = |e| WebError::resource_fetch_error(Course::get_resource_type(), e);
    let (rows, total, completed, quiz) = tokio::try_join!(
        ModuleWithLessonsRow::fetch_by_course(state.pool(), &actor, id),
        Lesson::count_in_course(state.pool(), &actor, id),
        LessonProgress::count_completed_in_course(state.pool(), &actor, actor.user_id(), id),
        Quiz::find_by_course(state.pool(), &actor, id),
    )
    .map_err(fetch_err)?;

    let modules = ModuleWithLessons::from_rows(rows).map_err(fetch_err)?;

    let outline = CourseOutline {
        course,
        modules,
        progress_pct: progress_pct(completed, total),
        has_quiz: quiz.is_some(),
    };
    Ok((StatusCode::OK, Json(outline)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/enroll",
    description = "Enrolls the caller. Enrolling twice is a no-op.",
    params(("course_id" = Uuid, Path, description = "ID of the course")),
    responses(
        (status = 200, description = "Enrolled", body = Enrollment),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []))
)]
pub(crate) async fn courses_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_visible_course(&state, user, id).await?;

    let enrollment = Enrollment::upsert(state.pool(), user, user.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/quiz",
    description = "The course's gating quiz, answer correctness hidden",
    params(("course_id" = Uuid, Path, description = "ID of the course")),
    responses(
        (status = 200, description = "Quiz found", body = QuizView),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course or quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(("cookie" = []))
)]
pub(crate) async fn courses_quiz_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_visible_course(&state, user, id).await?;

    let quiz = Quiz::find_by_course(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))?;

    let (questions, answers) = tokio::try_join!(
        QuizQuestion::find_all_by_quiz(state.pool(), user, quiz.id()),
        QuizAnswer::find_all_by_quiz(state.pool(), user, quiz.id()),
    )
    .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(QuizView::from_entities(&quiz, questions, answers))))
}
