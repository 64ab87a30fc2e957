use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    auth::{
        generate_random_token, hash_password,
        oauth::{self, OAUTH_STATE_COOKIE, OAuthUserInfo},
    },
    model::{
        CrudRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreateUpdate, UserSettingsUpdate},
    },
    web::{
        AppState, AuthenticatedUser, UserRole, WebError, WebResult,
        dto::account::{MAX_DISPLAY_NAME_CHARS, OAuthCallbackQuery}, error::ErrorResponse, middlewares::set_session_cookie,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{provider}", get(oauth_authorize_handler))
        .route("/{provider}/callback", get(oauth_callback_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/oauth/{provider}",
    description = "Redirects to the provider's consent page",
    params(("provider" = String, Path, description = "Provider name from `[[oauth]]`")),
    responses(
        (status = 303, description = "Redirect to provider"),
        (status = 404, description = "Unknown provider", body = ErrorResponse),
    ),
    tag = "account",
)]
pub(crate) async fn oauth_authorize_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(provider): Path<String>,
) -> WebResult<impl IntoResponse> {
    let Some(provider) = state.config().oauth_provider(&provider) else {
        return Err(WebError::resource_not_found(UserEntity::get_resource_type()));
    };

    let csrf = generate_random_token();
    let url = oauth::authorize_url(provider, &csrf).map_err(WebError::oauth_provider)?;

    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE, csrf);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(tower_cookies::cookie::time::Duration::minutes(10));
    cookies.add(cookie);

    Ok(Redirect::to(&url))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/oauth/{provider}/callback",
    description = "Completes external login, creating the account on first use",
    params(
        ("provider" = String, Path, description = "Provider name from `[[oauth]]`"),
        OAuthCallbackQuery,
    ),
    responses(
        (status = 200, description = "Signed in", body = UserEntity),
        (status = 401, description = "State mismatch or provider failure", body = ErrorResponse),
        (status = 404, description = "Unknown provider", body = ErrorResponse),
    ),
    tag = "account",
)]
pub(crate) async fn oauth_callback_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
) -> WebResult<impl IntoResponse> {
    let Some(provider) = state.config().oauth_provider(&provider) else {
        return Err(WebError::resource_not_found(UserEntity::get_resource_type()));
    };

    let expected = cookies.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let mut stale = Cookie::from(OAUTH_STATE_COOKIE);
    stale.set_path("/");
    cookies.remove(stale);
    if expected.as_deref() != Some(query.state.as_str()) {
        return Err(WebError::oauth_state_mismatch());
    }

    let access_token = oauth::exchange_code(state.http(), provider, &query.code)
        .await
        .map_err(WebError::oauth_provider)?;
    let info = oauth::fetch_user_info(state.http(), provider, &access_token)
        .await
        .map_err(WebError::oauth_provider)?;

    let user = find_or_create(&state, info).await?;
    tracing::info!(user_id = %user.id(), provider = %provider.name, "external login");

    set_session_cookie(&cookies, state.config().app().jwt(), user.id())?;
    Ok((StatusCode::OK, Json(user)))
}

async fn find_or_create(state: &AppState, info: OAuthUserInfo) -> WebResult<UserEntity> {
    let admin = AuthenticatedUser::admin();
    let fetch_err = |e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e);

    if let Some(found) = UserEntity::find_by_email(state.pool(), &admin, &info.email)
        .await
        .map_err(fetch_err)?
    {
        return Ok(found);
    }

    let mut username = info.username.clone();
    if UserEntity::find_by_username(state.pool(), &admin, &username)
        .await
        .map_err(fetch_err)?
        .is_some()
    {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        username = format!("{}-{}", info.username, &suffix[..6]);
    }

    // Password login stays unusable until the user sets one.
    let hash = hash_password(&generate_random_token()).map_err(WebError::server_crypt_error)?;
    let created = UserEntity::create(
        state.pool(),
        &admin,
        UserEntityCreateUpdate {
            username,
            password_hash: hash,
            email: Some(info.email),
            role: UserRole::User,
        },
    )
    .await
    .map_err(|e| WebError::from_database(UserEntity::get_resource_type(), e))?;

    created
        .update_settings(
            state.pool(),
            &admin,
            UserSettingsUpdate {
                display_name: Some(info.display_name.chars().take(MAX_DISPLAY_NAME_CHARS).collect()),
                bio: None,
                email: None,
                email_notifications: None,
            },
        )
        .await
        .map_err(fetch_err)
}
