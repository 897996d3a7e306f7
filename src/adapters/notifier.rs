use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::ports::{Notifier, NotifyError};

/// Notifier that only records the event in the log. Used when no mail relay
/// is configured.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify_payment_confirmed(&self, registration_id: &str) -> Result<(), NotifyError> {
        tracing::info!(registration_id, "payment confirmed, no mail relay configured");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct NotificationEvent<'a> {
    event: &'static str,
    registration_id: &'a str,
}

/// Posts notification events as JSON to the mail relay, which renders and
/// sends the confirmation email.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_payment_confirmed(&self, registration_id: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&NotificationEvent {
                event: "payment_confirmed",
                registration_id,
            })
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError(format!(
                "mail relay returned {}",
                response.status()
            )));
        }

        tracing::debug!(registration_id, "payment confirmation handed to mail relay");
        Ok(())
    }
}
