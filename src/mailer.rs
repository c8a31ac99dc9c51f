use anyhow::Context;
use axum::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::MailConfig;

/// Outbound email seam. Delivery failures are reported to the caller but
/// must never fail the surrounding request; handlers surface an `emailSent`
/// flag instead.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> anyhow::Result<()>;
}

/// Posts messages as JSON to an HTTP mail API (Mailgun-style relay).
pub struct HttpApiMailer {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    from: String,
}

impl HttpApiMailer {
    pub fn new(cfg: &MailConfig, endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token: cfg.api_token.clone(),
            from: cfg.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpApiMailer {
    async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.endpoint).json(&json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": text,
            "html": html,
        }));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.send()
            .await
            .context("mail api request")?
            .error_for_status()
            .context("mail api response")?;
        Ok(())
    }
}

/// Dev sender: logs the message and reports success.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, text: &str, _html: &str) -> anyhow::Result<()> {
        info!(%to, %subject, %text, "mail send stub");
        Ok(())
    }
}
