use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, WebhookFormat};
use crate::error::DeliveryError;

/// Body of the webhook callback fired after a successful publish.
#[derive(Debug, Clone)]
pub struct WebhookPayload {
    pub project_name: String,
    pub repo_url: String,
    pub metadata: BTreeMap<String, String>,
}

/// Renders the webhook body for the configured wire format. Formspree
/// expects flat form-style fields, so metadata is nested as a
/// JSON-encoded string there; the default format passes it through
/// as-is.
pub fn render_webhook_body(payload: &WebhookPayload, format: WebhookFormat) -> Value {
    match format {
        WebhookFormat::Json => json!({
            "project_name": payload.project_name,
            "repo_url": payload.repo_url,
            "metadata": payload.metadata,
        }),
        WebhookFormat::Formspree => json!({
            "subject": format!("Generation completed: {}", payload.project_name),
            "project_name": payload.project_name,
            "repo_url": payload.repo_url,
            "metadata": serde_json::to_string(&payload.metadata).unwrap_or_default(),
        }),
    }
}

/// Outbound notification capability. Both operations are side-effect
/// only and raise on transport failure; deciding whether a failure
/// matters is the caller's job, not this component's.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_webhook(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<(), DeliveryError>;

    async fn notify_email(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), DeliveryError>;
}

/// Real dispatcher: one HTTP POST per webhook, one authenticated
/// STARTTLS submission per email. No retries.
pub struct HttpNotifier {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl HttpNotifier {
    pub fn new(config: Arc<Config>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("scaffold-api")
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_webhook(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<(), DeliveryError> {
        let body = render_webhook_body(payload, self.config.webhook_format);

        let mut req = self.client.post(url).json(&body);
        if self.config.webhook_format == WebhookFormat::Formspree {
            req = req.header("Accept", "application/json");
        }

        req.send().await?.error_for_status()?;
        Ok(())
    }

    async fn notify_email(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), DeliveryError> {
        // Notifications are optional infrastructure: missing mail
        // configuration is a silent no-op, not an error.
        let (Some(host), Some(user), Some(pass), Some(from)) = (
            self.config.smtp_host.as_deref(),
            self.config.smtp_user.as_deref(),
            self.config.smtp_pass.as_deref(),
            self.config.mail_from.as_deref(),
        ) else {
            tracing::debug!("mail transport not configured, skipping email notification");
            return Ok(());
        };
        if recipient.is_empty() {
            return Ok(());
        }

        let message = Message::builder()
            .from(from.parse::<Mailbox>()?)
            .to(recipient.parse::<Mailbox>()?)
            .subject(subject)
            .body(body.to_string())?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .timeout(Some(Duration::from_secs(20)))
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}
