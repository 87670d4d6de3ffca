use crate::error::{NotifyError, Result};
use crate::{NotificationChannel, NotificationMessage};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use fleetmon_common::types::ChannelSpec;

#[derive(Deserialize)]
struct EmailConfig {
    smtp_host: String,
    #[serde(default = "default_smtp_port")]
    smtp_port: u16,
    smtp_user: Option<String>,
    smtp_password: Option<String>,
    from_email: String,
    to_emails: Vec<String>,
    #[serde(default)]
    use_tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

pub struct EmailChannel {
    channel_id: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: Vec<String>,
}

impl EmailChannel {
    pub fn from_spec(spec: &ChannelSpec) -> Result<Self> {
        let cfg: EmailConfig = serde_json::from_value(spec.config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("email: {e}")))?;
        if cfg.to_emails.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "email: to_emails must not be empty".into(),
            ));
        }

        let mut builder = if cfg.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
                .map_err(|e| NotifyError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_host)
        }
        .port(cfg.smtp_port);

        if let (Some(user), Some(pass)) = (cfg.smtp_user, cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            channel_id: spec.id.clone(),
            transport: builder.build(),
            from: cfg.from_email,
            to: cfg.to_emails,
        })
    }

    fn format_body(message: &NotificationMessage) -> String {
        format!(
            "Alert: {severity}\nRule: {rule}\nHost: {host}\nValue: {value:.2}\nOpened: {opened}\nMessage: {text}",
            severity = message.severity,
            rule = message.rule_name,
            host = message.host_id,
            value = message.value_observed,
            opened = message.opened_at.to_rfc3339(),
            text = message.message,
        )
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        let subject = message.subject();
        let body = Self::format_body(message);

        let from: lettre::message::Mailbox = self
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidConfig(format!("email: bad from_email: {e}")))?;

        for recipient in &self.to {
            let to = recipient
                .parse()
                .map_err(|e| NotifyError::InvalidConfig(format!("email: bad recipient: {e}")))?;
            let email = Message::builder()
                .from(from.clone())
                .to(to)
                .subject(&subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.clone())
                .map_err(|e| NotifyError::Smtp(e.to_string()))?;

            self.transport
                .send(email)
                .await
                .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        }
        Ok(())
    }

    fn channel_type(&self) -> &str {
        "email"
    }

    fn channel_id(&self) -> &str {
        &self.channel_id
    }
}
