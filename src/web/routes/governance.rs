use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::model::entity::{Proposal, ProposalCreate, ProposalStatus};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::governance::{ProposalDetails, ProposalListQuery, VoteBody, validate_proposal};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, AuthenticatedUser, RequestContext, WebError, WebResult};

const LIST_LIMIT: i64 = 100;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(proposals_list_handler).post(proposals_create_handler))
        .route("/{id}", get(proposals_get_handler))
        .route("/{id}/vote", post(proposals_vote_handler))
        .route("/{id}/validate", post(proposals_validate_handler))
        .route("/{id}/reject", post(proposals_reject_handler))
        .route("/{id}/close", post(proposals_close_handler))
        .with_state(state)
}

async fn find_proposal(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Proposal> {
    Proposal::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Proposal::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Proposal::get_resource_type()))
}

async fn details(state: &AppState, actor: &AuthenticatedUser, proposal: Proposal) -> WebResult<ProposalDetails> {
    let tally = proposal
        .tally(state.pool(), actor)
        .await
        .map_err(|e| WebError::resource_fetch_error(Proposal::get_resource_type(), e))?;
    Ok(ProposalDetails::new(proposal, tally))
}

/// Moves a proposal along its lifecycle on behalf of an admin.
async fn moderate(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
    to: ProposalStatus,
) -> WebResult<ProposalDetails> {
    let admin = ctx.admin_user()?;
    let proposal = find_proposal(state, admin, id).await?;

    let from = proposal.status();
    if !from.can_transition(to) {
        return Err(WebError::invalid_transition(
            Proposal::get_resource_type(),
            from.as_str(),
            to.as_str(),
        ));
    }

    let closes_at = (to == ProposalStatus::Open)
        .then(|| Utc::now() + Duration::days(state.config().governance().voting_days()));

    let moved = proposal
        .transition(state.pool(), admin, to, closes_at)
        .await
        .map_err(|e| WebError::resource_fetch_error(Proposal::get_resource_type(), e))?
        // lost a race with another moderator or the worker
        .ok_or(WebError::resource_conflict(Proposal::get_resource_type()))?;

    tracing::info!(proposal_id = %moved.id(), from = from.as_str(), to = to.as_str(), "proposal moderated");
    details(state, admin, moved).await
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/",
    description = "Submits a proposal. It waits for admin validation before voting opens.",
    request_body = ProposalCreate,
    responses(
        (status = 201, description = "Proposal created", body = Proposal),
        (status = 400, description = "Invalid title or body", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ProposalCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_proposal(&payload)?;

    let proposal = Proposal::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(Proposal::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(proposal)))
}

#[utoipa::path(
    get,
    path = "/api/v1/proposals/",
    description = "Proposals, newest first, optionally filtered by status",
    params(ProposalListQuery),
    responses(
        (status = 200, description = "Proposals", body = [Proposal]),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<ProposalListQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let proposals = match query.status {
        Some(status) => Proposal::list_by_status(state.pool(), user, status, LIST_LIMIT).await,
        None => Proposal::list(state.pool(), user, LIST_LIMIT, 0).await,
    }
    .map_err(|e| WebError::resource_fetch_error(Proposal::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(proposals)))
}

#[utoipa::path(
    get,
    path = "/api/v1/proposals/{proposal_id}",
    description = "A proposal with its vote tally",
    params(("proposal_id" = Uuid, Path, description = "ID of the proposal")),
    responses(
        (status = 200, description = "Proposal found", body = ProposalDetails),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Proposal not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let proposal = find_proposal(&state, user, id).await?;

    Ok((StatusCode::OK, Json(details(&state, user, proposal).await?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{proposal_id}/vote",
    description = "Casts or replaces the caller's vote while the proposal is open",
    request_body = VoteBody,
    params(("proposal_id" = Uuid, Path, description = "ID of the proposal")),
    responses(
        (status = 200, description = "Vote recorded", body = ProposalDetails),
        (status = 400, description = "Voting is not open", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Proposal not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_vote_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let proposal = find_proposal(&state, user, id).await?;

    if !proposal.accepts_votes(Utc::now()) {
        return Err(WebError::invalid_field("proposal", "voting is not open"));
    }

    proposal
        .cast_vote(state.pool(), user, payload.choice)
        .await
        .map_err(|e| WebError::resource_fetch_error(Proposal::get_resource_type(), e))?;
    tracing::debug!(proposal_id = %id, user_id = %user.user_id(), choice = payload.choice.as_str(), "vote cast");

    Ok((StatusCode::OK, Json(details(&state, user, proposal).await?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{proposal_id}/validate",
    description = "Opens a pending proposal for voting. Admin only.",
    params(("proposal_id" = Uuid, Path, description = "ID of the proposal")),
    responses(
        (status = 200, description = "Voting opened", body = ProposalDetails),
        (status = 400, description = "Proposal is not pending", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Proposal not found", body = ErrorResponse),
        (status = 409, description = "Proposal changed concurrently", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_validate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let res = moderate(&state, &ctx, id, ProposalStatus::Open).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{proposal_id}/reject",
    description = "Rejects a pending proposal. Admin only.",
    params(("proposal_id" = Uuid, Path, description = "ID of the proposal")),
    responses(
        (status = 200, description = "Proposal rejected", body = ProposalDetails),
        (status = 400, description = "Proposal is not pending", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Proposal not found", body = ErrorResponse),
        (status = 409, description = "Proposal changed concurrently", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_reject_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let res = moderate(&state, &ctx, id, ProposalStatus::Rejected).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{proposal_id}/close",
    description = "Closes voting early. Admin only.",
    params(("proposal_id" = Uuid, Path, description = "ID of the proposal")),
    responses(
        (status = 200, description = "Voting closed", body = ProposalDetails),
        (status = 400, description = "Proposal is not open", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Proposal not found", body = ErrorResponse),
        (status = 409, description = "Proposal changed concurrently", body = ErrorResponse),
    ),
    tag = "governance",
    security(("cookie" = []))
)]
pub(crate) async fn proposals_close_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let res = moderate(&state, &ctx, id, ProposalStatus::Closed).await?;
    Ok((StatusCode::OK, Json(res)))
}
