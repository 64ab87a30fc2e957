use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::{CryptError, oauth::OAuthError},
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,

    #[error("RegistrationEmailConflict")]
    RegistrationEmailConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationAdminRequired")]
    AuthenticationAdminRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,

    #[error("AuthenticationLinkInvalid")]
    AuthenticationLinkInvalid,

    #[error("AuthenticationOAuthStateMismatch")]
    AuthenticationOAuthStateMismatch,

    #[error("AuthenticationOAuthProvider: {0}")]
    AuthenticationOAuthProvider(#[from] OAuthError),
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}")]
    ResourceConflict { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ValidationInvalidField: {field}, {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("ValidationInvalidTransition: {resource_type:?} {from} -> {to}")]
    InvalidTransition {
        resource_type: ResourceType,
        from: &'static str,
        to: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::CONFLICT
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
            Self::RegistrationEmailConflict => {
                String::from("Registration error, email is already in use.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationAdminRequired => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationAdminRequired => String::from("Administrator role required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
            Self::AuthenticationLinkInvalid => {
                String::from("Authentication error, login link is invalid or expired.")
            }
            Self::AuthenticationOAuthStateMismatch | Self::AuthenticationOAuthProvider(_) => {
                String::from("Authentication error, external login failed.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceConflict { .. } => String::from("Resource error, resource already exists."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
        }
    }
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::InvalidField { field, reason } => format!("Validation error, {field}: {reason}."),
            Self::InvalidTransition { from, to, .. } => {
                format!("Validation error, cannot go from {from} to {to}.")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_conflict(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    /// Forbidden, unique and foreign key violations keep their meaning, everything else is a 500.
    pub fn from_database(r#type: ResourceType, error: DatabaseError) -> Self {
        if let DatabaseError::Forbidden = error {
            Self::resource_forbidden(r#type)
        } else if error.is_unique_violation() {
            Self::resource_conflict(r#type)
        } else if error.is_foreign_key_violation() {
            Self::resource_not_found(r#type)
        } else {
            Self::resource_fetch_error(r#type, error)
        }
    }

    pub fn invalid_field<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::ValidationError(ValidationError::InvalidField {
            field,
            reason: reason.into(),
        })
    }

    pub fn invalid_transition(r#type: ResourceType, from: &'static str, to: &'static str) -> Self {
        Self::ValidationError(ValidationError::InvalidTransition {
            resource_type: r#type,
            from,
            to,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn admin_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationAdminRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn auth_link_invalid() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationLinkInvalid)
    }

    pub fn oauth_state_mismatch() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationOAuthStateMismatch)
    }

    pub fn oauth_provider(e: OAuthError) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationOAuthProvider(e))
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn email_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationEmailConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ValidationError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ValidationError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log_error(&self);
        } else {
            tracing::debug!("{}", self);
        }

        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            WebError::resource_not_found(ResourceType::Course).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::resource_conflict(ResourceType::Quiz).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(WebError::admin_required().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(WebError::auth_required().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebError::auth_link_invalid().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebError::email_conflict().status_code(), StatusCode::CONFLICT);
        assert_eq!(
            WebError::invalid_field("bio", "too long").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn database_errors_map_by_kind() {
        let forbidden = WebError::from_database(ResourceType::Message, DatabaseError::Forbidden);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let other = WebError::from_database(
            ResourceType::Message,
            DatabaseError::SqlxError(sqlx::Error::RowNotFound),
        );
        assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_message_names_field() {
        let e = WebError::invalid_field("display_name", "must be 1 to 64 characters");
        assert_eq!(
            e.client_display(),
            "Validation error, display_name: must be 1 to 64 characters."
        );
    }
}
