use crate::web::{AppState, doc::ApiDoc, middlewares};
use axum::{Router, middleware};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod admin;
pub mod badges;
pub mod certificates;
pub mod courses;
pub mod governance;
pub mod lessons;
pub mod mentorship;
pub mod messages;
pub mod oauth;
pub mod progress;
pub mod quizzes;
pub mod user;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState) -> Router<S> {
    let docs = state.config().app().docs();

    let mut router = Router::new()
        .nest("/api/v1/account/oauth/", oauth::routes(state.clone()))
        .nest("/api/v1/account/", user::routes(state.clone()))
        .nest("/api/v1/courses/", courses::routes(state.clone()))
        .nest("/api/v1/lessons/", lessons::routes(state.clone()))
        .nest("/api/v1/quizzes/", quizzes::routes(state.clone()))
        .nest("/api/v1/certificates/", certificates::routes(state.clone()))
        .nest("/api/v1/badges/", badges::routes(state.clone()))
        .nest("/api/v1/progress/", progress::routes(state.clone()))
        .nest("/api/v1/proposals/", governance::routes(state.clone()))
        .nest("/api/v1/mentorship/", mentorship::routes(state.clone()))
        .nest("/api/v1/messages/", messages::routes(state.clone()))
        .nest("/api/v1/admin/", admin::routes(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        // must wrap the context middleware, which reads cookies
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if docs {
        router = router.merge(
            SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", ApiDoc::openapi()),
        );
    }

    router
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let q = PaginationQuery { limit: None, offset: None };
        assert_eq!((q.limit(), q.offset()), (20, 0));

        let q = PaginationQuery { limit: Some(500), offset: Some(-4) };
        assert_eq!((q.limit(), q.offset()), (100, 0));
    }
}
