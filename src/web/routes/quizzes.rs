use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use uuid::Uuid;

use crate::error::log_error;
use crate::model::entity::{
    Badge, Quiz, QuizAnswer, QuizAttempt, QuizAttemptCreate, QuizQuestion, grade,
};
use crate::model::progression::evaluate_certification;
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::quizzes::{AttemptBody, AttemptResult, QuestionResult};
use crate::web::error::ErrorResponse;
use crate::web::routes::courses::find_visible_course;
use crate::web::{AppState, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}/attempts", post(quizzes_attempt_handler))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{quiz_id}/attempts",
    description = "Grades an attempt. A passing attempt may complete the course.",
    request_body = AttemptBody,
    params(("quiz_id" = Uuid, Path, description = "ID of the quiz")),
    responses(
        (status = 200, description = "Attempt graded", body = AttemptResult),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(("cookie" = []))
)]
pub(crate) async fn quizzes_attempt_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttemptBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let fetch_err = |e| WebError::resource_fetch_error(Quiz::get_resource_type(), e);

    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err)?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))?;
    let course = find_visible_course(&state, user, quiz.course_id())
        .await
        .map_err(|_| WebError::resource_not_found(Quiz::get_resource_type()))?;

    let (questions, answers) = tokio::try_join!(
        QuizQuestion::find_all_by_quiz(state.pool(), user, quiz.id()),
        QuizAnswer::find_all_by_quiz(state.pool(), user, quiz.id()),
    )
    .map_err(fetch_err)?;

    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id()).collect();
    let graded = grade(&question_ids, &answers, &payload.answers, quiz.pass_score());

    let attempt = QuizAttempt::create(
        state.pool(),
        user,
        QuizAttemptCreate {
            user_id: user.user_id(),
            quiz_id: quiz.id(),
            score: graded.score,
            passed: graded.passed,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?;

    tracing::debug!(user_id = %user.user_id(), quiz_id = %quiz.id(), score = graded.score, "quiz attempt");

    let (course_status, certificate) = if graded.passed {
        let certification =
            evaluate_certification(state.pool(), user, &state.xp_rules(), user.user_id(), &course)
                .await
                .map_err(fetch_err)?;
        if certification.xp.is_some() {
            if let Err(e) = Badge::evaluate_for(state.pool(), user, user.user_id()).await {
                log_error(&e);
            }
        }
        (Some(certification.status), certification.certificate)
    } else {
        (None, None)
    };

    let result = AttemptResult {
        attempt_id: attempt.id(),
        score: graded.score,
        passed: graded.passed,
        pass_score: quiz.pass_score(),
        results: QuestionResult::from_grade(&graded, &questions),
        course_status,
        certificate,
    };
    Ok((StatusCode::OK, Json(result)))
}
