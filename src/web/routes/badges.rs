use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use crate::model::ResourceTyped;
use crate::model::entity::{Badge, UserBadgeRow};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(badges_list_handler))
        .route("/mine", get(badges_mine_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/badges/",
    description = "Every badge that can be earned",
    responses(
        (status = 200, description = "Badges", body = [Badge]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "badges"
)]
pub(crate) async fn badges_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let badges = Badge::all(state.pool(), &ctx.user_or_guest())
        .await
        .map_err(|e| WebError::resource_fetch_error(Badge::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(badges)))
}

#[utoipa::path(
    get,
    path = "/api/v1/badges/mine",
    description = "Badges the caller has earned, in award order",
    responses(
        (status = 200, description = "Earned badges", body = [UserBadgeRow]),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "badges",
    security(("cookie" = []))
)]
pub(crate) async fn badges_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let badges = UserBadgeRow::fetch_by_user(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Badge::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(badges)))
}
