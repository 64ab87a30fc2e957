use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::model::ResourceTyped;
use crate::model::entity::UserEntity;
use crate::web::dto::progress::{LeaderboardEntry, LeaderboardQuery};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/leaderboard", get(progress_leaderboard_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/leaderboard",
    description = "Learners ranked by XP. Ties go to whoever joined first.",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntry]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress"
)]
pub(crate) async fn progress_leaderboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> WebResult<impl IntoResponse> {
    let users = UserEntity::leaderboard(state.pool(), &ctx.user_or_guest(), query.limit())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(LeaderboardEntry::ranked(users))))
}
