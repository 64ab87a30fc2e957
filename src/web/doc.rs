use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT session of the current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "campus", description = "Community learning platform API"),
    paths(
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_signout_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::user::user_me_handler,
        crate::web::routes::user::user_progress_handler,
        crate::web::routes::user::user_settings_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::user::magic_link_request_handler,
        crate::web::routes::user::magic_link_consume_handler,
        crate::web::routes::oauth::oauth_authorize_handler,
        crate::web::routes::oauth::oauth_callback_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_enroll_handler,
        crate::web::routes::courses::courses_quiz_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_mark_done_handler,
        crate::web::routes::quizzes::quizzes_attempt_handler,
        crate::web::routes::certificates::certificates_mine_handler,
        crate::web::routes::certificates::certificates_verify_handler,
        crate::web::routes::badges::badges_list_handler,
        crate::web::routes::badges::badges_mine_handler,
        crate::web::routes::progress::progress_leaderboard_handler,
        crate::web::routes::governance::proposals_create_handler,
        crate::web::routes::governance::proposals_list_handler,
        crate::web::routes::governance::proposals_get_handler,
        crate::web::routes::governance::proposals_vote_handler,
        crate::web::routes::governance::proposals_validate_handler,
        crate::web::routes::governance::proposals_reject_handler,
        crate::web::routes::governance::proposals_close_handler,
        crate::web::routes::mentorship::educators_create_handler,
        crate::web::routes::mentorship::educators_get_handler,
        crate::web::routes::mentorship::sessions_book_handler,
        crate::web::routes::mentorship::sessions_list_handler,
        crate::web::routes::mentorship::sessions_status_handler,
        crate::web::routes::messages::messages_send_handler,
        crate::web::routes::messages::messages_inbox_handler,
        crate::web::routes::messages::messages_conversation_handler,
        crate::web::routes::admin::admin_course_create_handler,
        crate::web::routes::admin::admin_course_update_handler,
        crate::web::routes::admin::admin_course_delete_handler,
        crate::web::routes::admin::admin_module_create_handler,
        crate::web::routes::admin::admin_module_update_handler,
        crate::web::routes::admin::admin_module_delete_handler,
        crate::web::routes::admin::admin_lesson_create_handler,
        crate::web::routes::admin::admin_lesson_update_handler,
        crate::web::routes::admin::admin_lesson_delete_handler,
        crate::web::routes::admin::admin_quiz_create_handler,
        crate::web::routes::admin::admin_quiz_update_handler,
        crate::web::routes::admin::admin_quiz_delete_handler,
        crate::web::routes::admin::admin_question_create_handler,
        crate::web::routes::admin::admin_question_update_handler,
        crate::web::routes::admin::admin_question_delete_handler,
        crate::web::routes::admin::admin_answer_create_handler,
        crate::web::routes::admin::admin_answer_update_handler,
        crate::web::routes::admin::admin_answer_delete_handler,
        crate::web::routes::admin::admin_badge_create_handler,
        crate::web::routes::admin::admin_badge_delete_handler,
    ),
    tags(
        (name = "account", description = "Registration, sessions and settings"),
        (name = "courses", description = "Course catalog and enrollment"),
        (name = "lessons", description = "Lesson content and completion"),
        (name = "quizzes", description = "Gating quizzes"),
        (name = "certificates", description = "Issued certificates"),
        (name = "badges", description = "Achievements"),
        (name = "progress", description = "XP and leaderboard"),
        (name = "governance", description = "Community proposals and votes"),
        (name = "mentorship", description = "Educators and session booking"),
        (name = "messages", description = "Direct messages"),
        (name = "admin", description = "Content management"),
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_routes_and_cookie_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/lessons/{lesson_id}/done"));
        assert!(doc.paths.paths.contains_key("/api/v1/certificates/verify/{serial}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("cookie"));
    }
}
