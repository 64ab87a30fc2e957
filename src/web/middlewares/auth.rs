use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    auth::{self, SESSION_TTL_HOURS, UserClaims},
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, WebError, WebResult, context::AuthenticatedUser},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the `SID` cookie into a [`RequestContext`]. A missing, invalid or
/// stale cookie leaves the request anonymous.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let user = match cookies.get(AUTH_TOKEN) {
        Some(token) => resolve_user(&state, token.value()).await?,
        None => None,
    };

    req.extensions_mut().insert(RequestContext::new(user));
    Ok(next.run(req).await)
}

async fn resolve_user(state: &AppState, token: &str) -> WebResult<Option<AuthenticatedUser>> {
    let claims = match auth::process_token(token, state.config().app().jwt()) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!("ignoring invalid session cookie: {e}");
            return Ok(None);
        }
    };

    let Ok(id) = claims.sub.parse::<Uuid>() else {
        return Ok(None);
    };

    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok(found.map(|user| AuthenticatedUser::new(id, user.role())))
}

/// Issues a fresh session for `user_id` and stores it in the `SID` cookie.
pub fn set_session_cookie(cookies: &Cookies, jwt_secret: &str, user_id: Uuid) -> WebResult<()> {
    let claims = UserClaims::for_user(user_id);
    let token = auth::generate_token(claims, jwt_secret)
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(tower_cookies::cookie::time::Duration::hours(SESSION_TTL_HOURS));
    cookies.add(cookie);
    Ok(())
}

pub fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
}
