//! Outgoing mail through an HTTP relay.
//!
//! Delivery is best effort: callers log failures and carry on.

use serde::Serialize;

mod error;
pub use error::{MailError, MailResult};

use crate::Config;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    endpoint: Option<String>,
    from: String,
    http: reqwest::Client,
}

impl Mailer {
    pub fn new(endpoint: Option<String>, from: String, http: reqwest::Client) -> Self {
        Self {
            endpoint,
            from,
            http,
        }
    }

    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self::new(
            config.mail().endpoint().map(str::to_string),
            config.mail().from().to_string(),
            http,
        )
    }

    pub fn compose(&self, to: &str, subject: &str, text: &str) -> OutgoingMail {
        OutgoingMail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        }
    }

    #[tracing::instrument(skip(self, text))]
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> MailResult<()> {
        let mail = self.compose(to, subject, text);

        let Some(endpoint) = self.endpoint.as_deref() else {
            tracing::info!(to = %mail.to, subject = %mail.subject, "mail relay not configured, skipping delivery");
            return Ok(());
        };

        let response = self.http.post(endpoint).json(&mail).send().await?;
        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status().as_u16()));
        }

        tracing::debug!(to = %mail.to, "mail delivered to relay");
        Ok(())
    }

    /// Sends and swallows the error, logging it.
    pub async fn send_or_log(&self, to: &str, subject: &str, text: &str) {
        if let Err(e) = self.send(to, subject, text).await {
            crate::error::log_error(&e);
        }
    }
}
