use crate::error::{NotifyError, Result};
use crate::{NotificationChannel, NotificationMessage};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use fleetmon_common::types::ChannelSpec;

#[derive(Deserialize)]
struct WebhookConfig {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: HashMap<String, String>,
}

fn default_method() -> String {
    "POST".to_string()
}

#[derive(Clone, Copy)]
enum Method {
    Post,
    Put,
}

pub struct WebhookChannel {
    channel_id: String,
    client: reqwest::Client,
    url: String,
    method: Method,
    headers: HashMap<String, String>,
}

impl WebhookChannel {
    pub fn from_spec(spec: &ChannelSpec) -> Result<Self> {
        let cfg: WebhookConfig = serde_json::from_value(spec.config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("webhook: {e}")))?;
        let method = match cfg.method.to_uppercase().as_str() {
            "POST" => Method::Post,
            "PUT" => Method::Put,
            other => {
                return Err(NotifyError::InvalidConfig(format!(
                    "webhook: unsupported method '{other}' (expected POST or PUT)"
                )));
            }
        };
        Ok(Self {
            channel_id: spec.id.clone(),
            client: reqwest::Client::new(),
            url: cfg.url,
            method,
            headers: cfg.headers,
        })
    }

    fn payload(message: &NotificationMessage) -> serde_json::Value {
        serde_json::json!({
            "alert_id": message.alert_id,
            "rule_name": message.rule_name,
            "host_id": message.host_id,
            "severity": message.severity.to_string(),
            "value_observed": message.value_observed,
            "opened_at": message.opened_at.to_rfc3339(),
            "message": message.message,
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        let mut req = match self.method {
            Method::Post => self.client.post(&self.url),
            Method::Put => self.client.put(&self.url),
        };
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }

        let resp = req.json(&Self::payload(message)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                service: "webhook",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn channel_type(&self) -> &str {
        "webhook"
    }

    fn channel_id(&self) -> &str {
        &self.channel_id
    }
}
