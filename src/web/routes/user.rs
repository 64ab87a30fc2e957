use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{Duration, Utc};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    auth::{MAGIC_LINK_TTL_MINUTES, generate_random_token, hash_password, verify_password},
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{LoginToken, LoginTokenCreate, UserEntity, UserEntityCreateUpdate},
        progression::{ProgressSummary, progress_summary},
    },
    web::{
        AppState, AuthenticatedUser, JsonOrForm, RequestContext, UserRole, WebError, WebResult,
        dto::account::{
            MagicLinkRequestBody, MessageResponse, SettingsBody, SigninBody, SignupBody,
            UsernameBody, is_valid_email, validate_credentials,
        },
        error::ErrorResponse,
        middlewares::{clear_session_cookie, set_session_cookie},
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/signup", post(user_signup_handler))
        .route("/signin", post(user_signin_handler))
        .route("/signout", post(user_signout_handler))
        .route("/verify", get(user_verify_handler))
        .route("/me", get(user_me_handler))
        .route("/me/progress", get(user_progress_handler))
        .route("/settings", put(user_settings_handler).post(user_settings_handler))
        .route("/page", get(user_list_handler))
        .route("/magic-link", post(magic_link_request_handler))
        .route("/magic-link/{token}", get(magic_link_consume_handler))
        .route(
            "/{id}",
            put(user_update_handler).delete(user_delete_handler),
        )
        .with_state(state)
}

async fn find_user(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<UserEntity> {
    UserEntity::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = SignupBody,
    description = "Creates new user in database and signs them in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid username, password or email", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignupBody>,
) -> WebResult<impl IntoResponse> {
    validate_credentials(&payload.username, &payload.password)?;
    let email = payload.email.map(|e| e.trim().to_lowercase());
    if email.as_ref().is_some_and(|e| !is_valid_email(e)) {
        return Err(WebError::invalid_field("email", "must be a valid address"));
    }

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    if let Some(email) = &email {
        let taken = UserEntity::find_by_email(state.pool(), &admin, email)
            .await
            .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
        if taken.is_some() {
            return Err(WebError::email_conflict());
        }
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        username: payload.username,
        password_hash: hash,
        email,
        role: UserRole::User,
    };

    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
            }
        })?;

    tracing::info!(user_id = %created.id(), "user signed up");
    set_session_cookie(&cookies, state.config().app().jwt(), created.id())?;
    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
pub(crate) async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let Some(found) = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
    else {
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    set_session_cookie(&cookies, state.config().app().jwt(), found.id())?;
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Drops the session cookie",
    responses((status = 200, description = "Signed out")),
    tag = "account",
)]
pub(crate) async fn user_signout_handler(cookies: Cookies) -> impl IntoResponse {
    clear_session_cookie(&cookies);
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/v1/account/verify",
    description = "200 when the session cookie identifies a user",
    responses(
        (status = 200, description = "Session valid"),
        (status = 401, description = "No valid session"),
    ),
    tag = "account",
)]
pub(crate) async fn user_verify_handler(ctx: RequestContext) -> impl IntoResponse {
    if ctx.maybe_user().is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
pub(crate) async fn user_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(&state, user, user.user_id()).await?;
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me/progress",
    description = "XP, level and learning summary of the current user",
    responses(
        (status = 200, description = "Progress summary", body = ProgressSummary),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []))
)]
pub(crate) async fn user_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(&state, user, user.user_id()).await?;

    let summary = progress_summary(state.pool(), user, &state.xp_rules(), &found)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(summary)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/settings",
    description = "Updates profile settings. Accepts JSON or urlencoded form data.",
    request_body(content = SettingsBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Settings updated", body = UserEntity),
        (status = 400, description = "Invalid value", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
pub(crate) async fn user_settings_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonOrForm(payload): JsonOrForm<SettingsBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let update = payload.validate()?;
    let found = find_user(&state, user, user.user_id()).await?;

    if let Some(email) = &update.email {
        let owner = UserEntity::find_by_email(state.pool(), user, email)
            .await
            .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
        if owner.is_some_and(|o| o.id() != user.user_id()) {
            return Err(WebError::email_conflict());
        }
    }

    let updated = found
        .update_settings(state.pool(), user, update)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::email_conflict()
            } else {
                WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
            }
        })?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
pub(crate) async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let users = UserEntity::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UsernameBody,
    params(("id" = Uuid, Path, description = "User to rename")),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't have enough permissions to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
pub(crate) async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UsernameBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(&state, user, id).await?;
    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::from_database(UserEntity::get_resource_type(), e))?;

    let username = payload.username.trim().to_string();
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(WebError::invalid_field("username", "must be 3 to 32 characters"));
    }

    let conflict = UserEntity::find_by_username(state.pool(), user, &username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    if conflict.is_some_and(|c| c.id() != found.id()) {
        return Err(WebError::registration_conflict());
    }

    let role = found.role();
    let payload = UserEntityCreateUpdate {
        username,
        password_hash: String::new(),
        email: None,
        role,
    };

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user",
    params(("id" = Uuid, Path, description = "User to delete")),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(("cookie" = []))
)]
pub(crate) async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(&state, user, id).await?;
    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::from_database(UserEntity::get_resource_type(), e))?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if id == user.user_id() {
        clear_session_cookie(&cookies);
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/magic-link",
    description = "Mails a one-time login link. Always answers 200 so addresses cannot be probed.",
    request_body = MagicLinkRequestBody,
    responses((status = 200, description = "Request accepted", body = MessageResponse)),
    tag = "account",
)]
pub(crate) async fn magic_link_request_handler(
    State(state): State<AppState>,
    Json(payload): Json<MagicLinkRequestBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let accepted = Json(MessageResponse {
        message: String::from("If the address is registered, a login link is on its way."),
    });

    if !is_valid_email(&payload.email) {
        return Ok((StatusCode::OK, accepted));
    }

    let found = UserEntity::find_by_email(state.pool(), &admin, &payload.email)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    let Some(found) = found else {
        return Ok((StatusCode::OK, accepted));
    };
    let Some(email) = found.email() else {
        return Ok((StatusCode::OK, accepted));
    };

    let token = LoginToken::create(
        state.pool(),
        &admin,
        LoginTokenCreate {
            token: generate_random_token(),
            user_id: found.id(),
            expires_at: Utc::now() + Duration::minutes(MAGIC_LINK_TTL_MINUTES),
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(LoginToken::get_resource_type(), e))?;

    let link = format!(
        "{}/api/v1/account/magic-link/{}",
        state.config().app().public_url(),
        token.token()
    );
    let text = format!(
        "Hi {},\n\nUse this link to sign in within {MAGIC_LINK_TTL_MINUTES} minutes:\n{link}\n",
        found.display_name()
    );
    state.mailer().send_or_log(email, "Your login link", &text).await;

    Ok((StatusCode::OK, accepted))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/magic-link/{token}",
    description = "Signs in with a one-time login link",
    params(("token" = String, Path, description = "Token from the mailed link")),
    responses(
        (status = 200, description = "Signed in", body = UserEntity),
        (status = 401, description = "Link unknown, used or expired", body = ErrorResponse),
    ),
    tag = "account",
)]
pub(crate) async fn magic_link_consume_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(token): Path<String>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let consumed = LoginToken::consume(state.pool(), &admin, &token)
        .await
        .map_err(|e| WebError::resource_fetch_error(LoginToken::get_resource_type(), e))?;

    let Some(consumed) = consumed.filter(|t| !t.is_expired(Utc::now())) else {
        return Err(WebError::auth_link_invalid());
    };

    let Some(found) = UserEntity::find_by_id(state.pool(), &admin, consumed.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
    else {
        return Err(WebError::auth_link_invalid());
    };

    set_session_cookie(&cookies, state.config().app().jwt(), found.id())?;
    Ok((StatusCode::OK, Json(found)))
}
