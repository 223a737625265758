//! The alerting seam: anything that can deliver a notification message.

use crate::Result;
use anyhow::Context;
use serde::Serialize;
use tracing::warn;
use url::Url;

/// Notifies about alerts. How a message actually reaches someone (email,
/// push, log line) is opaque to the rest of the app.
#[async_trait::async_trait]
pub trait Alerter {
    async fn alert(&self, msg: &str) -> Result<()>;
}

/// Writes alerts to the log. The default sink for interactive use.
#[derive(Debug, Default)]
pub struct LogAlerter;

#[async_trait::async_trait]
impl Alerter for LogAlerter {
    async fn alert(&self, msg: &str) -> Result<()> {
        warn!("ALERT: {msg}");
        Ok(())
    }
}

/// Posts alerts as a JSON payload to a webhook URL.
pub struct WebhookAlerter {
    client: reqwest::Client,
    url: Url,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    source: &'a str,
    message: &'a str,
}

impl WebhookAlerter {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl Alerter for WebhookAlerter {
    async fn alert(&self, msg: &str) -> Result<()> {
        let payload = WebhookPayload {
            source: "water-monitor",
            message: msg,
        };
        self.client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("failed to deliver alert to {}", self.url))?
            .error_for_status()
            .with_context(|| format!("alert webhook {} rejected the alert", self.url))?;
        Ok(())
    }
}
