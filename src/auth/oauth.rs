//! OAuth2 authorization-code login against providers listed in `[[oauth]]`.

use serde::Deserialize;
use serde_json::Value;

pub use super::error::{OAuthError, OAuthResult};
use crate::config::OAuthProvider;

pub static OAUTH_STATE_COOKIE: &str = "oauth_state";

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthUserInfo {
    pub email: String,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub fn authorize_url(provider: &OAuthProvider, state: &str) -> OAuthResult<String> {
    let scope = provider.scopes.join(" ");
    let url = reqwest::Url::parse_with_params(
        &provider.authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", provider.client_id.as_str()),
            ("redirect_uri", provider.redirect_url.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;

    Ok(url.to_string())
}

pub async fn exchange_code(
    http: &reqwest::Client,
    provider: &OAuthProvider,
    code: &str,
) -> OAuthResult<String> {
    let response: TokenResponse = http
        .post(&provider.token_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", provider.redirect_url.as_str()),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response.access_token)
}

pub async fn fetch_user_info(
    http: &reqwest::Client,
    provider: &OAuthProvider,
    access_token: &str,
) -> OAuthResult<OAuthUserInfo> {
    let body: Value = http
        .get(&provider.userinfo_url)
        .bearer_auth(access_token)
        .header(reqwest::header::USER_AGENT, crate::APPLICATION_NAME)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    user_info_from_value(&body)
}

/// Providers disagree on claim names; OIDC (`preferred_username`, `name`) and
/// GitHub-style (`login`) payloads are both accepted.
pub fn user_info_from_value(body: &Value) -> OAuthResult<OAuthUserInfo> {
    let field = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let email = field("email").ok_or(OAuthError::MissingField("email"))?;
    let username = field("preferred_username")
        .or_else(|| field("login"))
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let display_name = field("name").unwrap_or_else(|| username.clone());

    Ok(OAuthUserInfo {
        email: email.to_lowercase(),
        username,
        display_name,
    })
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn provider() -> OAuthProvider {
        OAuthProvider {
            name: String::from("github"),
            client_id: String::from("cid"),
            client_secret: String::from("secret"),
            authorize_url: String::from("https://example.com/authorize"),
            token_url: String::from("https://example.com/token"),
            userinfo_url: String::from("https://example.com/user"),
            redirect_url: String::from("http://localhost/cb"),
            scopes: vec![String::from("read:user"), String::from("user:email")],
        }
    }

    #[test]
    fn authorize_url_contains_params() {
        let url = authorize_url(&provider(), "xyz").unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "cid");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["redirect_uri"], "http://localhost/cb");
        assert_eq!(params["scope"], "read:user user:email");
        assert_eq!(params["response_type"], "code");
    }

    #[test]
    fn authorize_url_rejects_garbage() {
        let mut p = provider();
        p.authorize_url = String::from("not a url");
        assert!(matches!(authorize_url(&p, "s"), Err(OAuthError::InvalidUrl(_))));
    }

    #[test]
    fn user_info_github_shape() {
        let info = user_info_from_value(&json!({
            "login": "octocat",
            "name": "The Octocat",
            "email": "Octo@GitHub.com",
        }))
        .unwrap();
        assert_eq!(info.username, "octocat");
        assert_eq!(info.display_name, "The Octocat");
        assert_eq!(info.email, "octo@github.com");
    }

    #[test]
    fn user_info_falls_back_to_email_local_part() {
        let info = user_info_from_value(&json!({ "email": "jane@example.com" })).unwrap();
        assert_eq!(info.username, "jane");
        assert_eq!(info.display_name, "jane");
    }

    #[test]
    fn user_info_requires_email() {
        assert!(matches!(
            user_info_from_value(&json!({ "login": "ghost", "email": null })),
            Err(OAuthError::MissingField("email"))
        ));
    }
}
