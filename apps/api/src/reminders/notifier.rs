use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::reminders::email::ReminderEmail;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email webhook rejected the message (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("recipient has no email address")]
    NoRecipient,
}

/// Delivers rendered reminder emails.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn deliver(&self, email: &ReminderEmail) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Posts each email as JSON to a mail-relay webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    from: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, from: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            url: url.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl ReminderNotifier for WebhookNotifier {
    async fn deliver(&self, email: &ReminderEmail) -> Result<(), NotifyError> {
        if email.to.trim().is_empty() {
            return Err(NotifyError::NoRecipient);
        }

        let payload = WebhookPayload {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.text,
            html: &email.html,
        };
        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
