mod auth;
pub use auth::{AUTH_TOKEN, clear_session_cookie, extract_context_fn, set_session_cookie};
