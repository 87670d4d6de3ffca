use crate::error::{NotifyError, Result};
use crate::{NotificationChannel, NotificationMessage};
use async_trait::async_trait;
use serde::Deserialize;

use fleetmon_common::types::{ChannelSpec, Severity};

#[derive(Deserialize)]
struct SlackConfig {
    webhook_url: String,
}

pub struct SlackChannel {
    channel_id: String,
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackChannel {
    pub fn from_spec(spec: &ChannelSpec) -> Result<Self> {
        let cfg: SlackConfig = serde_json::from_value(spec.config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("slack: {e}")))?;
        Ok(Self {
            channel_id: spec.id.clone(),
            client: reqwest::Client::new(),
            webhook_url: cfg.webhook_url,
        })
    }

    fn attachment_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Info => "#439fe0",
            Severity::Warning => "warning",
            Severity::Critical => "danger",
        }
    }

    fn payload(message: &NotificationMessage) -> serde_json::Value {
        serde_json::json!({
            "attachments": [{
                "color": Self::attachment_color(message.severity),
                "title": message.subject(),
                "text": message.message,
                "fields": [
                    { "title": "Host", "value": message.host_id, "short": true },
                    { "title": "Severity", "value": message.severity.to_string(), "short": true },
                    { "title": "Value", "value": format!("{:.2}", message.value_observed), "short": true },
                    { "title": "Opened", "value": message.opened_at.to_rfc3339(), "short": true },
                ],
                "ts": message.opened_at.timestamp(),
            }]
        })
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(message))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                service: "slack",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn channel_type(&self) -> &str {
        "slack"
    }

    fn channel_id(&self) -> &str {
        &self.channel_id
    }
}
