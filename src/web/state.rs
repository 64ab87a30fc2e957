use crate::{Config, mail::Mailer, model::ModelManager, model::gamification::XpRules};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    config: &'static Config,
    mailer: Mailer,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(mm: ModelManager, config: &'static Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            mm,
            config,
            mailer: Mailer::from_config(config, http.clone()),
            http,
        }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn xp_rules(&self) -> XpRules {
        XpRules::from_config(self.config)
    }
}
