use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    admin: Option<Admin>,
    #[serde(default)]
    gamification: Gamification,
    #[serde(default)]
    governance: Governance,
    #[serde(default)]
    mail: Mail,
    #[serde(default)]
    oauth: Vec<OAuthProvider>,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_public_url")]
    public_url: String,
}

/// Bootstrap administrator, created on startup when missing.
#[derive(Debug, Deserialize)]
pub struct Admin {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct Gamification {
    #[serde(default = "default_course_xp_bonus")]
    course_xp_bonus: i64,
    #[serde(default = "default_level_base_xp")]
    level_base_xp: i64,
}

#[derive(Debug, Deserialize)]
pub struct Governance {
    #[serde(default = "default_voting_days")]
    voting_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct Mail {
    endpoint: Option<String>,
    #[serde(default = "default_mail_from")]
    from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthProvider {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_public_url() -> String {
    String::from("http://127.0.0.1:5000")
}

fn default_course_xp_bonus() -> i64 {
    100
}

fn default_level_base_xp() -> i64 {
    100
}

fn default_voting_days() -> i64 {
    7
}

fn default_mail_from() -> String {
    String::from("no-reply@campus.local")
}

impl Default for Gamification {
    fn default() -> Self {
        Self {
            course_xp_bonus: default_course_xp_bonus(),
            level_base_xp: default_level_base_xp(),
        }
    }
}

impl Default for Governance {
    fn default() -> Self {
        Self {
            voting_days: default_voting_days(),
        }
    }
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            endpoint: None,
            from: default_mail_from(),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::from_slice(&bytes)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        if config.gamification.level_base_xp <= 0 {
            return Err(ConfigError::Invalid("gamification.level_base_xp must be positive"));
        }
        if config.governance.voting_days <= 0 {
            return Err(ConfigError::Invalid("governance.voting_days must be positive"));
        }
        Ok(config)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn admin(&self) -> Option<&Admin> {
        self.admin.as_ref()
    }

    #[inline]
    pub fn gamification(&self) -> &Gamification {
        &self.gamification
    }

    #[inline]
    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    #[inline]
    pub fn mail(&self) -> &Mail {
        &self.mail
    }

    pub fn oauth_provider(&self, name: &str) -> Option<&OAuthProvider> {
        self.oauth.iter().find(|p| p.name == name)
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn public_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}

impl Admin {
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Gamification {
    #[inline]
    pub fn course_xp_bonus(&self) -> i64 {
        self.course_xp_bonus
    }

    #[inline]
    pub fn level_base_xp(&self) -> i64 {
        self.level_base_xp
    }
}

impl Governance {
    #[inline]
    pub fn voting_days(&self) -> i64 {
        self.voting_days
    }
}

impl Mail {
    #[inline]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    #[inline]
    pub fn from(&self) -> &str {
        &self.from
    }
}
