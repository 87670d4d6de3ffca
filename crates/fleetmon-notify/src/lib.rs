//! Notification routing and delivery.
//!
//! Alerts that survive mute and cooldown gating are resolved to their
//! rule's channels by [`router::NotificationRouter`], then fanned out
//! concurrently by [`dispatcher::ChannelDispatcher`]. Built-in channels
//! cover email (SMTP), Slack and Discord webhooks, and generic HTTP
//! webhooks; the set is closed and selected by
//! [`ChannelKind`](fleetmon_common::types::ChannelKind) in
//! [`channels::build`].

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod router;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error::Result;
use fleetmon_common::types::Severity;

/// The logically uniform payload every channel renders into its native
/// shape (plain-text email, Slack attachment, Discord embed, JSON body).
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub alert_id: String,
    pub rule_name: String,
    pub host_id: String,
    pub severity: Severity,
    pub value_observed: f64,
    pub opened_at: DateTime<Utc>,
    pub message: String,
}

impl NotificationMessage {
    /// One-line title used as email subject / chat message header.
    pub fn subject(&self) -> String {
        format!(
            "[fleetmon][{}] {} - {}",
            self.severity, self.rule_name, self.host_id
        )
    }
}

/// A notification delivery channel that sends alert payloads to an
/// external service (SMTP relay, chat webhook, HTTP endpoint).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers the payload through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response
    /// from the external service. The dispatcher records the error; it is
    /// never propagated into the alert lifecycle.
    async fn deliver(&self, message: &NotificationMessage) -> Result<()>;

    /// Returns the channel type name (e.g., `"email"`, `"webhook"`).
    fn channel_type(&self) -> &str;

    /// The channel spec ID this instance was built from.
    fn channel_id(&self) -> &str;
}

/// Per-channel outcome of one dispatch attempt.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub channel_id: String,
    pub channel_type: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration: std::time::Duration,
}
