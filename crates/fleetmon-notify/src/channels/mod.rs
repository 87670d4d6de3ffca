//! Built-in channel implementations.

pub mod discord;
pub mod email;
pub mod slack;
pub mod webhook;

use crate::error::Result;
use crate::NotificationChannel;
use fleetmon_common::types::{ChannelKind, ChannelSpec};

/// Constructs the concrete channel for a spec, validating its config.
///
/// The set of channel types is closed: dispatch is selected here by
/// `spec.kind`, and each variant keeps its formatting logic local.
pub fn build(spec: &ChannelSpec) -> Result<Box<dyn NotificationChannel>> {
    match spec.kind {
        ChannelKind::Email => Ok(Box::new(email::EmailChannel::from_spec(spec)?)),
        ChannelKind::Slack => Ok(Box::new(slack::SlackChannel::from_spec(spec)?)),
        ChannelKind::Discord => Ok(Box::new(discord::DiscordChannel::from_spec(spec)?)),
        ChannelKind::Webhook => Ok(Box::new(webhook::WebhookChannel::from_spec(spec)?)),
    }
}
