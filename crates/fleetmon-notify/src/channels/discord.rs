use crate::error::{NotifyError, Result};
use crate::{NotificationChannel, NotificationMessage};
use async_trait::async_trait;
use serde::Deserialize;

use fleetmon_common::types::{ChannelSpec, Severity};

#[derive(Deserialize)]
struct DiscordConfig {
    webhook_url: String,
}

pub struct DiscordChannel {
    channel_id: String,
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordChannel {
    pub fn from_spec(spec: &ChannelSpec) -> Result<Self> {
        let cfg: DiscordConfig = serde_json::from_value(spec.config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("discord: {e}")))?;
        Ok(Self {
            channel_id: spec.id.clone(),
            client: reqwest::Client::new(),
            webhook_url: cfg.webhook_url,
        })
    }

    fn embed_color(severity: Severity) -> u32 {
        match severity {
            Severity::Info => 0x3498db,     // blue
            Severity::Warning => 0xf1c40f,  // yellow
            Severity::Critical => 0xe74c3c, // red
        }
    }

    fn payload(message: &NotificationMessage) -> serde_json::Value {
        serde_json::json!({
            "embeds": [{
                "title": message.subject(),
                "description": message.message,
                "color": Self::embed_color(message.severity),
                "fields": [
                    { "name": "Host", "value": message.host_id, "inline": true },
                    { "name": "Severity", "value": message.severity.to_string(), "inline": true },
                    { "name": "Value", "value": format!("{:.2}", message.value_observed), "inline": true },
                ],
                "timestamp": message.opened_at.to_rfc3339(),
            }]
        })
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
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
                service: "discord",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn channel_type(&self) -> &str {
        "discord"
    }

    fn channel_id(&self) -> &str {
        &self.channel_id
    }
}
