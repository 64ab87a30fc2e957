use serde::{Deserialize, Serialize};

use crate::model::entity::UserSettingsUpdate;
use crate::web::{WebError, WebResult};

pub const MAX_DISPLAY_NAME_CHARS: usize = 64;
pub const MAX_BIO_CHARS: usize = 500;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UsernameBody {
    pub username: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct SettingsBody {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub email_notifications: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MagicLinkRequestBody {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(' '),
        None => false,
    }
}

pub fn validate_credentials(username: &str, password: &str) -> WebResult<()> {
    let len = username.trim().chars().count();
    if !(3..=32).contains(&len) || username.trim() != username {
        return Err(WebError::invalid_field("username", "must be 3 to 32 characters without surrounding spaces"));
    }
    if password.chars().count() < 8 {
        return Err(WebError::invalid_field("password", "must be at least 8 characters"));
    }
    Ok(())
}

impl SettingsBody {
    /// Trims values and checks their bounds.
    pub fn validate(self) -> WebResult<UserSettingsUpdate> {
        let display_name = self.display_name.map(|s| s.trim().to_string());
        if let Some(name) = &display_name {
            let len = name.chars().count();
            if !(1..=MAX_DISPLAY_NAME_CHARS).contains(&len) {
                return Err(WebError::invalid_field("display_name", "must be 1 to 64 characters"));
            }
        }

        let bio = self.bio.map(|s| s.trim().to_string());
        if bio.as_ref().is_some_and(|b| b.chars().count() > MAX_BIO_CHARS) {
            return Err(WebError::invalid_field("bio", "must be at most 500 characters"));
        }

        let email = self.email.map(|s| s.trim().to_lowercase());
        if email.as_ref().is_some_and(|e| !is_valid_email(e)) {
            return Err(WebError::invalid_field("email", "must be a valid address"));
        }

        Ok(UserSettingsUpdate {
            display_name,
            bio,
            email,
            email_notifications: self.email_notifications,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("  learner@campus.org "));
        assert!(!is_valid_email("nobody"));
        assert!(!is_valid_email("@campus.org"));
        assert!(!is_valid_email("learner@"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[test]
    fn settings_are_trimmed() {
        let body = SettingsBody {
            display_name: Some(String::from("  Ada  ")),
            email: Some(String::from(" Ada@Campus.org ")),
            ..Default::default()
        };
        let update = body.validate().unwrap();
        assert_eq!(update.display_name.as_deref(), Some("Ada"));
        assert_eq!(update.email.as_deref(), Some("ada@campus.org"));
        assert_eq!(update.bio, None);
    }

    #[test]
    fn settings_bounds() {
        let blank = SettingsBody {
            display_name: Some(String::from("   ")),
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        let long_name = SettingsBody {
            display_name: Some("x".repeat(65)),
            ..Default::default()
        };
        assert!(long_name.validate().is_err());

        let long_bio = SettingsBody {
            bio: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(long_bio.validate().is_err());

        let max_bio = SettingsBody {
            bio: Some("x".repeat(500)),
            ..Default::default()
        };
        assert!(max_bio.validate().is_ok());

        let bad_email = SettingsBody {
            email: Some(String::from("not-an-email")),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn credentials_rules() {
        assert!(validate_credentials("ada", "correct horse").is_ok());
        assert!(validate_credentials("ad", "correct horse").is_err());
        assert!(validate_credentials(" ada", "correct horse").is_err());
        assert!(validate_credentials("ada", "short").is_err());
    }
}
