use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::model::entity::{InboxEntryRow, MAX_MESSAGE_CHARS, Message, UserEntity, normalize_body};
use crate::model::{CrudRepository, ResourceTyped};
use crate::web::dto::messages::SendMessageBody;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(messages_send_handler))
        .route("/inbox", get(messages_inbox_handler))
        .route("/conversation/{user_id}", get(messages_conversation_handler))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/messages/",
    description = "Sends a direct message",
    request_body = SendMessageBody,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 400, description = "Empty or oversized body, or sent to yourself", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Recipient not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "messages",
    security(("cookie" = []))
)]
pub(crate) async fn messages_send_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<SendMessageBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let Some(body) = normalize_body(&payload.body) else {
        return Err(WebError::invalid_field(
            "body",
            format!("must be 1 to {MAX_MESSAGE_CHARS} characters"),
        ));
    };
    if payload.recipient_id == user.user_id() {
        return Err(WebError::invalid_field("recipient_id", "cannot message yourself"));
    }

    let recipient = UserEntity::find_by_id(state.pool(), user, payload.recipient_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let message = Message::send(state.pool(), user, recipient.id(), body)
        .await
        .map_err(|e| WebError::resource_fetch_error(Message::get_resource_type(), e))?;

    if let Some(to) = recipient.notification_email() {
        state
            .mailer()
            .send_or_log(to, "You have a new message", message.body())
            .await;
    }

    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/inbox",
    description = "One entry per conversation partner, newest first",
    responses(
        (status = 200, description = "Inbox", body = [InboxEntryRow]),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "messages",
    security(("cookie" = []))
)]
pub(crate) async fn messages_inbox_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let inbox = InboxEntryRow::fetch_for(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Message::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(inbox)))
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/conversation/{user_id}",
    description = "Messages exchanged with a user, oldest first. Marks incoming ones as read.",
    params(("user_id" = Uuid, Path, description = "ID of the other user")),
    responses(
        (status = 200, description = "Conversation", body = [Message]),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "messages",
    security(("cookie" = []))
)]
pub(crate) async fn messages_conversation_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let fetch_err = |e| WebError::resource_fetch_error(Message::get_resource_type(), e);

    let messages = Message::conversation(state.pool(), user, partner_id)
        .await
        .map_err(fetch_err)?;
    Message::mark_read_from(state.pool(), user, partner_id)
        .await
        .map_err(fetch_err)?;

    Ok((StatusCode::OK, Json(messages)))
}
