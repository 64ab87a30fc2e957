use thiserror::Error;

pub type CryptResult<T> = std::result::Result<T, CryptError>;
pub type OAuthResult<T> = std::result::Result<T, OAuthError>;

#[derive(Debug, Error)]
pub enum CryptError {
    #[error("argon2 error: {0}")]
    Argon2Error(#[from] argon2::password_hash::Error),
    #[error("jwt error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Failure talking to an external login provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("invalid provider url: {0}")]
    InvalidUrl(String),
    #[error("provider response is missing `{0}`")]
    MissingField(&'static str),
}
