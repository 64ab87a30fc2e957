use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use uuid::Uuid;

use crate::model::entity::{
    Badge, BadgeCreate, Course, CourseCreate, Lesson, LessonCreate, Module, ModuleCreate, Quiz,
    QuizAnswer, QuizAnswerCreate, QuizCreate, QuizQuestion, QuizQuestionCreate,
};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::admin::{validate_badge, validate_course, validate_quiz, validate_title};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, AuthenticatedUser, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/courses", post(admin_course_create_handler))
        .route("/courses/{id}", put(admin_course_update_handler).delete(admin_course_delete_handler))
        .route("/modules", post(admin_module_create_handler))
        .route("/modules/{id}", put(admin_module_update_handler).delete(admin_module_delete_handler))
        .route("/lessons", post(admin_lesson_create_handler))
        .route("/lessons/{id}", put(admin_lesson_update_handler).delete(admin_lesson_delete_handler))
        .route("/quizzes", post(admin_quiz_create_handler))
        .route("/quizzes/{id}", put(admin_quiz_update_handler).delete(admin_quiz_delete_handler))
        .route("/questions", post(admin_question_create_handler))
        .route("/questions/{id}", put(admin_question_update_handler).delete(admin_question_delete_handler))
        .route("/answers", post(admin_answer_create_handler))
        .route("/answers/{id}", put(admin_answer_update_handler).delete(admin_answer_delete_handler))
        .route("/badges", post(admin_badge_create_handler))
        .route("/badges/{id}", axum::routing::delete(admin_badge_delete_handler))
        .with_state(state)
}

async fn find_for_admin<T, C>(state: &AppState, admin: &AuthenticatedUser, id: Uuid) -> WebResult<T>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Send + Sync,
    C: Send,
{
    T::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(T::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(T::get_resource_type()))
}

async fn update_by_id<T, C>(state: &AppState, admin: &AuthenticatedUser, id: Uuid, data: C) -> WebResult<T>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Send + Sync,
    C: Send,
{
    let found = find_for_admin::<T, C>(state, admin, id).await?;
    found
        .update(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::from_database(T::get_resource_type(), e))
}

async fn delete_by_id<T, C>(state: &AppState, admin: &AuthenticatedUser, id: Uuid) -> WebResult<()>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Send + Sync,
    C: Send,
{
    let found = find_for_admin::<T, C>(state, admin, id).await?;
    found
        .delete(state.pool(), admin)
        .await
        .map_err(|e| WebError::from_database(T::get_resource_type(), e))?;
    tracing::info!(%id, resource = ?T::get_resource_type(), "deleted by admin");
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses",
    description = "Creates a course. Admin only.",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_course_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_course(&payload)?;

    let created = Course::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(Course::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/courses/{course_id}",
    description = "Replaces a course. Admin only.",
    request_body = CourseCreate,
    params(("course_id" = Uuid, Path, description = "ID of the course")),
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_course_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_course(&payload)?;

    let updated = update_by_id::<Course, _>(&state, admin, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/courses/{course_id}",
    description = "Deletes a course. Admin only.",
    params(("course_id" = Uuid, Path, description = "ID of the course")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_course_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<Course, CourseCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/modules",
    description = "Creates a module. Admin only.",
    request_body = ModuleCreate,
    responses(
        (status = 201, description = "Created", body = Module),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Parent resource not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_module_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_title(&payload.title)?;

    let created = Module::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(Module::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/modules/{module_id}",
    description = "Replaces a module. Admin only.",
    request_body = ModuleCreate,
    params(("module_id" = Uuid, Path, description = "ID of the module")),
    responses(
        (status = 200, description = "Updated", body = Module),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_module_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_title(&payload.title)?;

    let updated = update_by_id::<Module, _>(&state, admin, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/modules/{module_id}",
    description = "Deletes a module. Admin only.",
    params(("module_id" = Uuid, Path, description = "ID of the module")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_module_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<Module, ModuleCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons",
    description = "Creates a lesson. Admin only.",
    request_body = LessonCreate,
    responses(
        (status = 201, description = "Created", body = Lesson),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Parent resource not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_lesson_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_title(&payload.title)?;

    let created = Lesson::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/lessons/{lesson_id}",
    description = "Replaces a lesson. Admin only.",
    request_body = LessonCreate,
    params(("lesson_id" = Uuid, Path, description = "ID of the lesson")),
    responses(
        (status = 200, description = "Updated", body = Lesson),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_lesson_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_title(&payload.title)?;

    let updated = update_by_id::<Lesson, _>(&state, admin, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/lessons/{lesson_id}",
    description = "Deletes a lesson. Admin only.",
    params(("lesson_id" = Uuid, Path, description = "ID of the lesson")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_lesson_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<Lesson, LessonCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/quizzes",
    description = "Creates a quiz. Admin only.",
    request_body = QuizCreate,
    responses(
        (status = 201, description = "Created", body = Quiz),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Parent resource not found", body = ErrorResponse),
        (status = 409, description = "Course already has a quiz", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_quiz_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_quiz(&payload)?;

    let created = Quiz::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/quizzes/{quiz_id}",
    description = "Replaces a quiz. Admin only.",
    request_body = QuizCreate,
    params(("quiz_id" = Uuid, Path, description = "ID of the quiz")),
    responses(
        (status = 200, description = "Updated", body = Quiz),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Course already has a quiz", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_quiz_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_quiz(&payload)?;

    let updated = update_by_id::<Quiz, _>(&state, admin, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/quizzes/{quiz_id}",
    description = "Deletes a quiz. Admin only.",
    params(("quiz_id" = Uuid, Path, description = "ID of the quiz")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_quiz_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<Quiz, QuizCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/questions",
    description = "Creates a question. Admin only.",
    request_body = QuizQuestionCreate,
    responses(
        (status = 201, description = "Created", body = QuizQuestion),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Parent resource not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_question_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizQuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    if payload.question.trim().is_empty() {
        return Err(WebError::invalid_field("question", "cannot be empty"));
    }

    let created = QuizQuestion::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(QuizQuestion::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/questions/{question_id}",
    description = "Replaces a question. Admin only.",
    request_body = QuizQuestionCreate,
    params(("question_id" = Uuid, Path, description = "ID of the question")),
    responses(
        (status = 200, description = "Updated", body = QuizQuestion),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_question_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizQuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    if payload.question.trim().is_empty() {
        return Err(WebError::invalid_field("question", "cannot be empty"));
    }

    let updated = update_by_id::<QuizQuestion, _>(&state, admin, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/questions/{question_id}",
    description = "Deletes a question. Admin only.",
    params(("question_id" = Uuid, Path, description = "ID of the question")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_question_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<QuizQuestion, QuizQuestionCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/answers",
    description = "Creates a answer. Admin only.",
    request_body = QuizAnswerCreate,
    responses(
        (status = 201, description = "Created", body = QuizAnswer),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Parent resource not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_answer_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizAnswerCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    if payload.answer_text.trim().is_empty() {
        return Err(WebError::invalid_field("answer_text", "cannot be empty"));
    }

    let created = QuizAnswer::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(QuizAnswer::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/answers/{answer_id}",
    description = "Replaces a answer. Admin only.",
    request_body = QuizAnswerCreate,
    params(("answer_id" = Uuid, Path, description = "ID of the answer")),
    responses(
        (status = 200, description = "Updated", body = QuizAnswer),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_answer_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizAnswerCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    if payload.answer_text.trim().is_empty() {
        return Err(WebError::invalid_field("answer_text", "cannot be empty"));
    }

    let updated = update_by_id::<QuizAnswer, _>(&state, admin, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/answers/{answer_id}",
    description = "Deletes a answer. Admin only.",
    params(("answer_id" = Uuid, Path, description = "ID of the answer")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_answer_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<QuizAnswer, QuizAnswerCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/badges",
    description = "Creates a badge. Admin only.",
    request_body = BadgeCreate,
    responses(
        (status = 201, description = "Created", body = Badge),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_badge_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<BadgeCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_badge(&payload)?;

    let created = Badge::create(state.pool(), admin, payload)
        .await
        .map_err(|e| WebError::from_database(Badge::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/badges/{badge_id}",
    description = "Deletes a badge. Admin only.",
    params(("badge_id" = Uuid, Path, description = "ID of the badge")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(("cookie" = []))
)]
pub(crate) async fn admin_badge_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    delete_by_id::<Badge, BadgeCreate>(&state, admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
